//! Transport seam and the authenticated session every operation runs through.

use crate::{dn::DistinguishedName, Result};
use async_trait::async_trait;
use ldap3::Scope;
use std::collections::HashMap;

/// Represents the search scope for LDAP queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Base object only.
    Base,
    /// One level below the base.
    OneLevel,
    /// Entire subtree.
    Subtree,
}

impl From<SearchScope> for Scope {
    fn from(scope: SearchScope) -> Self {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }
}

/// Raw search result as returned by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    /// Textual attribute values, in server order.
    pub attributes: HashMap<String, Vec<String>>,
    /// Attribute values that are not valid UTF-8 (for example `objectGUID`).
    pub binary_attributes: HashMap<String, Vec<Vec<u8>>>,
}

/// Attribute name with its complete value set, used when adding entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapAttribute {
    /// Attribute name.
    pub name: String,
    /// Attribute values as raw octets.
    pub values: Vec<Vec<u8>>,
}

impl LdapAttribute {
    /// Builds an attribute from textual values.
    #[must_use]
    pub fn text<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values
                .into_iter()
                .map(|value| value.into().into_bytes())
                .collect(),
        }
    }
}

/// LDAP modification request.
///
/// Values are raw octets so binary encodings such as the UTF-16LE password form can be sent
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryModification {
    /// Add attribute values.
    Add {
        /// Attribute to modify.
        attribute: String,
        /// Values to add.
        values: Vec<Vec<u8>>,
    },
    /// Delete attribute values.
    Delete {
        /// Attribute to modify.
        attribute: String,
        /// Values to delete (empty removes attribute).
        values: Vec<Vec<u8>>,
    },
    /// Replace attribute values.
    Replace {
        /// Attribute to modify.
        attribute: String,
        /// Replacement values.
        values: Vec<Vec<u8>>,
    },
}

impl DirectoryModification {
    /// Returns the attribute this modification targets.
    #[must_use]
    pub fn attribute(&self) -> &str {
        match self {
            Self::Add { attribute, .. }
            | Self::Delete { attribute, .. }
            | Self::Replace { attribute, .. } => attribute,
        }
    }
}

/// A connected directory transport.
///
/// Implementations report every failure as [`adkit_core::Error::TransportError`]; the
/// operations built on top re-tag those failures with the kind of request that failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DirectorySession: Send {
    /// Authenticates the connection.
    async fn simple_bind(&mut self, dn: &str, password: &str) -> Result<()>;

    /// Searches below `base_dn`.
    async fn search(
        &mut self,
        base_dn: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&'static str],
    ) -> Result<Vec<LdapEntry>>;

    /// Applies modifications to a single entry.
    async fn modify(&mut self, dn: &str, modifications: &[DirectoryModification]) -> Result<()>;

    /// Adds a new entry.
    async fn add(&mut self, dn: &str, attributes: &[LdapAttribute]) -> Result<()>;

    /// Renames and/or relocates an entry.
    async fn modify_dn(
        &mut self,
        dn: &str,
        new_rdn: &str,
        delete_old_rdn: bool,
        new_superior: &str,
    ) -> Result<()>;

    /// Closes the connection.
    async fn unbind(&mut self) -> Result<()>;
}

/// One authenticated directory connection.
///
/// Every resolver, mutator, membership, hierarchy and policy operation is a method on
/// `Session` taking `&mut self`, so a session is used by one caller at a time.
pub struct Session {
    transport: Box<dyn DirectorySession>,
    base_dn: DistinguishedName,
    user_principal_suffix: Option<String>,
}

impl Session {
    /// Wraps an already connected and bound transport.
    #[must_use]
    pub fn new(transport: Box<dyn DirectorySession>, base_dn: DistinguishedName) -> Self {
        let user_principal_suffix = base_dn.dns_domain();
        Self {
            transport,
            base_dn,
            user_principal_suffix,
        }
    }

    /// Overrides the suffix used for new accounts' `userPrincipalName`.
    #[must_use]
    pub fn with_user_principal_suffix(mut self, suffix: Option<String>) -> Self {
        self.user_principal_suffix = suffix;
        self
    }

    /// Returns the base DN searched by the resolver.
    #[must_use]
    pub const fn base_dn(&self) -> &DistinguishedName {
        &self.base_dn
    }

    /// Returns the `userPrincipalName` suffix, if any.
    #[must_use]
    pub fn user_principal_suffix(&self) -> Option<&str> {
        self.user_principal_suffix.as_deref()
    }

    /// Closes the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`adkit_core::Error::TransportError`] if the transport fails to unbind.
    pub async fn unbind(mut self) -> Result<()> {
        self.transport.unbind().await
    }

    pub(crate) fn transport(&mut self) -> &mut dyn DirectorySession {
        self.transport.as_mut()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_dn", &self.base_dn)
            .field("user_principal_suffix", &self.user_principal_suffix)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub(crate) const BASE_DN: &str = "DC=test,DC=com";

    pub(crate) fn session(mock: MockDirectorySession) -> Session {
        Session::new(
            Box::new(mock),
            DistinguishedName::parse(BASE_DN).unwrap(),
        )
    }

    pub(crate) fn entry(dn: &str, attributes: &[(&str, &str)]) -> LdapEntry {
        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in attributes {
            map.entry((*name).to_string())
                .or_default()
                .push((*value).to_string());
        }
        LdapEntry {
            dn: dn.to_string(),
            attributes: map,
            binary_attributes: HashMap::new(),
        }
    }

    pub(crate) fn replace(attribute: &str, value: &str) -> DirectoryModification {
        DirectoryModification::Replace {
            attribute: attribute.to_string(),
            values: vec![value.as_bytes().to_vec()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_derives_principal_suffix_from_base_dn() {
        let session = test_support::session(MockDirectorySession::new());
        assert_eq!(session.user_principal_suffix(), Some("test.com"));

        let session = session.with_user_principal_suffix(Some("corp.example".to_string()));
        assert_eq!(session.user_principal_suffix(), Some("corp.example"));
    }

    #[tokio::test]
    async fn unbind_closes_transport() {
        let mut mock = MockDirectorySession::new();
        mock.expect_unbind().times(1).returning(|| Ok(()));
        test_support::session(mock).unbind().await.unwrap();
    }

    #[test]
    fn text_attribute_encodes_utf8() {
        let attribute = LdapAttribute::text("objectClass", ["top", "group"]);
        assert_eq!(
            attribute.values,
            vec![b"top".to_vec(), b"group".to_vec()]
        );
    }
}
