//! Entry creation and relocation across containers.

use crate::{
    dn::{DistinguishedName, RelativeDistinguishedName},
    resolver::EntryKind,
    session::{LdapAttribute, Session},
    Result,
};
use adkit_core::Error;
use tracing::{debug, info};

impl EntryKind {
    fn object_classes(self) -> &'static [&'static str] {
        match self {
            Self::User => &["top", "organizationalPerson", "user", "person"],
            Self::Group => &["top", "group"],
            Self::OrganizationalUnit => &["top", "organizationalUnit"],
        }
    }
}

impl Session {
    /// Minimal attribute set for a new entry of `kind` named `name`.
    fn creation_attributes(&self, kind: EntryKind, name: &str) -> Vec<LdapAttribute> {
        let mut attributes = vec![LdapAttribute::text(
            "objectClass",
            kind.object_classes().iter().copied(),
        )];
        match kind {
            EntryKind::User => {
                attributes.push(LdapAttribute::text("sAMAccountName", [name]));
                if let Some(suffix) = self.user_principal_suffix() {
                    attributes.push(LdapAttribute::text(
                        "userPrincipalName",
                        [format!("{name}@{suffix}")],
                    ));
                }
            }
            EntryKind::Group => {
                attributes.push(LdapAttribute::text("sAMAccountName", [name]));
                attributes.push(LdapAttribute::text("displayName", [name]));
            }
            EntryKind::OrganizationalUnit => {
                attributes.push(LdapAttribute::text("ou", [name]));
            }
        }
        attributes
    }

    /// Creates an entry of `kind` named `name` directly below `container`.
    ///
    /// Returns the new entry's DN. Nothing is rolled back if the server rejects the request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a malformed container DN and
    /// [`Error::CreateFailed`] with the server's message when the add is rejected, for example
    /// because the DN already exists.
    pub async fn create_entry(
        &mut self,
        kind: EntryKind,
        name: &str,
        container: &str,
    ) -> Result<DistinguishedName> {
        let dn = DistinguishedName::parse(container)?
            .with_prefix(RelativeDistinguishedName::new(kind.naming_attribute(), name));
        let attributes = self.creation_attributes(kind, name);
        debug!(dn = %dn, "creating {kind}");

        self.transport()
            .add(dn.as_str(), &attributes)
            .await
            .map_err(|err| Error::CreateFailed(format!("{dn}: {}", err.detail())))?;

        info!(dn = %dn, "{kind} created");
        Ok(dn)
    }

    /// Creates a user account below `container`.
    ///
    /// # Errors
    ///
    /// See [`Session::create_entry`].
    pub async fn create_user(
        &mut self,
        account_name: &str,
        container: &str,
    ) -> Result<DistinguishedName> {
        self.create_entry(EntryKind::User, account_name, container)
            .await
    }

    /// Creates a group below `container`.
    ///
    /// # Errors
    ///
    /// See [`Session::create_entry`].
    pub async fn create_group(
        &mut self,
        account_name: &str,
        container: &str,
    ) -> Result<DistinguishedName> {
        self.create_entry(EntryKind::Group, account_name, container)
            .await
    }

    /// Creates an organizational unit below `container`.
    ///
    /// # Errors
    ///
    /// See [`Session::create_entry`].
    pub async fn create_organizational_unit(
        &mut self,
        name: &str,
        container: &str,
    ) -> Result<DistinguishedName> {
        self.create_entry(EntryKind::OrganizationalUnit, name, container)
            .await
    }

    /// Moves an entry below `new_parent`, optionally giving it a new name.
    ///
    /// The naming attribute of the current RDN is kept; only its value changes when
    /// `new_name` is given. The old RDN value is removed from the entry.
    ///
    /// # Errors
    ///
    /// Resolver errors are returned unchanged, a malformed `new_parent` is
    /// [`Error::InvalidRequest`], and a rejected modify-DN is [`Error::MoveFailed`].
    pub async fn move_entry(
        &mut self,
        kind: EntryKind,
        identifier: &str,
        new_parent: &str,
        new_name: Option<&str>,
    ) -> Result<DistinguishedName> {
        let new_parent = DistinguishedName::parse(new_parent)?;
        let entry = self.resolve(kind, identifier).await?;
        let source = entry.dn().clone();
        self.relocate(&source, new_parent, new_name).await
    }

    /// Renames an entry in place.
    ///
    /// # Errors
    ///
    /// See [`Session::move_entry`]. An entry with no parent container is
    /// [`Error::InvalidRequest`].
    pub async fn rename_entry(
        &mut self,
        kind: EntryKind,
        identifier: &str,
        new_name: &str,
    ) -> Result<DistinguishedName> {
        let entry = self.resolve(kind, identifier).await?;
        let source = entry.dn().clone();
        let parent = source
            .parent()
            .ok_or_else(|| Error::InvalidRequest(format!("{source} has no parent container")))?;
        self.relocate(&source, parent, Some(new_name)).await
    }

    /// Moves a user account below `new_parent`, keeping its name.
    ///
    /// # Errors
    ///
    /// See [`Session::move_entry`].
    pub async fn move_user(
        &mut self,
        account_name: &str,
        new_parent: &str,
    ) -> Result<DistinguishedName> {
        self.move_entry(EntryKind::User, account_name, new_parent, None)
            .await
    }

    async fn relocate(
        &mut self,
        source: &DistinguishedName,
        new_parent: DistinguishedName,
        new_name: Option<&str>,
    ) -> Result<DistinguishedName> {
        let current = source
            .rdn()
            .ok_or_else(|| Error::InvalidRequest(format!("{source} has no RDN")))?;
        let rdn = RelativeDistinguishedName::new(
            current.attribute(),
            new_name.unwrap_or_else(|| current.value()),
        );
        let new_rdn = rdn.to_string();
        debug!(dn = %source, new_rdn = %new_rdn, new_parent = %new_parent, "moving entry");

        self.transport()
            .modify_dn(source.as_str(), &new_rdn, true, new_parent.as_str())
            .await
            .map_err(|err| {
                Error::MoveFailed(format!("{source} to {new_parent}: {}", err.detail()))
            })?;

        let target = new_parent.with_prefix(rdn);
        info!(from = %source, to = %target, "entry moved");
        Ok(target)
    }
}
