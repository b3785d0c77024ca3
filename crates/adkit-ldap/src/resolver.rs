//! Unique entry lookup.
//!
//! A lookup succeeds only when exactly one entry matches. Zero matches yield
//! [`Error::NotFound`]; two or more yield [`Error::AmbiguousMatch`]. The resolver never picks a
//! candidate on the caller's behalf.

use crate::{
    entry::DirectoryEntry,
    session::{SearchScope, Session},
    Result,
};
use adkit_core::Error;
use std::fmt;
use tracing::debug;

/// Request every user attribute plus the operational `objectGUID`.
const ENTRY_ATTRIBUTES: &[&str] = &["*", "objectGUID"];

/// Object categories the resolver can look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A user account, keyed by `sAMAccountName`.
    User,
    /// A security or distribution group, keyed by `sAMAccountName`.
    Group,
    /// An organizational unit, keyed by its distinguished name.
    OrganizationalUnit,
}

impl EntryKind {
    /// `objectClass` value used in the search filter.
    #[must_use]
    pub const fn object_class(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::OrganizationalUnit => "organizationalUnit",
        }
    }

    /// Attribute matched against the identifier.
    #[must_use]
    pub const fn identifier_attribute(self) -> &'static str {
        match self {
            Self::User | Self::Group => "sAMAccountName",
            Self::OrganizationalUnit => "distinguishedName",
        }
    }

    /// Attribute used for the leaf RDN of newly created entries.
    #[must_use]
    pub const fn naming_attribute(self) -> &'static str {
        match self {
            Self::User | Self::Group => "CN",
            Self::OrganizationalUnit => "OU",
        }
    }

    /// Builds the search filter for `identifier`.
    #[must_use]
    pub fn search_filter(self, identifier: &str) -> String {
        format!(
            "(&(objectClass={})({}={}))",
            self.object_class(),
            self.identifier_attribute(),
            escape_filter_value(identifier)
        )
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Group => "group",
            Self::OrganizationalUnit => "organizational unit",
        })
    }
}

impl Session {
    /// Resolves exactly one entry of `kind` matching `identifier` below the base DN.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when nothing matches, [`Error::AmbiguousMatch`] when more
    /// than one entry matches, and [`Error::TransportError`] if the search itself fails.
    pub async fn resolve(&mut self, kind: EntryKind, identifier: &str) -> Result<DirectoryEntry> {
        let filter = kind.search_filter(identifier);
        let base_dn = self.base_dn().as_str().to_string();
        debug!(base_dn = %base_dn, filter = %filter, "resolving {kind}");

        let mut entries = self
            .transport()
            .search(&base_dn, SearchScope::Subtree, &filter, ENTRY_ATTRIBUTES)
            .await?;

        match entries.len() {
            0 => Err(Error::NotFound(format!(
                "{kind} `{identifier}` does not exist below {base_dn}"
            ))),
            1 => DirectoryEntry::from_ldap(entries.remove(0)),
            count => {
                let dns = entries
                    .iter()
                    .map(|entry| entry.dn.as_str())
                    .collect::<Vec<_>>()
                    .join("; ");
                Err(Error::AmbiguousMatch(format!(
                    "{kind} `{identifier}` matched {count} entries: {dns}"
                )))
            }
        }
    }

    /// Resolves a user by account name.
    ///
    /// # Errors
    ///
    /// See [`Session::resolve`].
    pub async fn find_user(&mut self, account_name: &str) -> Result<DirectoryEntry> {
        self.resolve(EntryKind::User, account_name).await
    }

    /// Resolves a group by account name.
    ///
    /// # Errors
    ///
    /// See [`Session::resolve`].
    pub async fn find_group(&mut self, account_name: &str) -> Result<DirectoryEntry> {
        self.resolve(EntryKind::Group, account_name).await
    }

    /// Resolves an organizational unit by distinguished name.
    ///
    /// # Errors
    ///
    /// See [`Session::resolve`].
    pub async fn find_organizational_unit(&mut self, dn: &str) -> Result<DirectoryEntry> {
        self.resolve(EntryKind::OrganizationalUnit, dn).await
    }
}

/// Escapes a value for use inside an LDAP filter assertion (RFC 4515).
pub(crate) fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '*' => escaped.push_str("\\2a"),
            '(' => escaped.push_str("\\28"),
            ')' => escaped.push_str("\\29"),
            '\\' => escaped.push_str("\\5c"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
