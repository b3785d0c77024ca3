//! Resolved directory entries.

use crate::{dn::DistinguishedName, session::LdapEntry, Result};
use adkit_core::{FileTime, ObjectGuid};
use std::collections::BTreeMap;
use tracing::warn;

/// Snapshot of a single directory entry produced by the resolver.
///
/// Entries cannot be built by callers; they only come out of a successful, unique lookup, so
/// holding one means the distinguished name was confirmed by the server. Attribute names are
/// kept in sorted order and looked up case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    dn: DistinguishedName,
    attributes: BTreeMap<String, Vec<String>>,
    binary_attributes: BTreeMap<String, Vec<Vec<u8>>>,
}

impl DirectoryEntry {
    pub(crate) fn from_ldap(entry: LdapEntry) -> Result<Self> {
        Ok(Self {
            dn: DistinguishedName::parse(&entry.dn)?,
            attributes: entry.attributes.into_iter().collect(),
            binary_attributes: entry.binary_attributes.into_iter().collect(),
        })
    }

    /// Distinguished name of the entry.
    #[must_use]
    pub const fn dn(&self) -> &DistinguishedName {
        &self.dn
    }

    /// Iterates over the textual attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.attributes
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    /// Returns all values for the attribute.
    #[must_use]
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values.as_slice())
    }

    /// Returns the first value of the attribute if present.
    #[must_use]
    pub fn first(&self, attribute: &str) -> Option<&str> {
        self.values(attribute)
            .and_then(|values| values.first().map(String::as_str))
    }

    /// Returns the raw values of a binary attribute.
    #[must_use]
    pub fn binary_values(&self, attribute: &str) -> Option<&[Vec<u8>]> {
        self.binary_attributes
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values.as_slice())
    }

    /// Parses the first value of the attribute as an unsigned integer.
    #[must_use]
    pub fn u64_value(&self, attribute: &str) -> Option<u64> {
        self.first(attribute).and_then(|value| value.trim().parse().ok())
    }

    /// Parses the first value of the attribute as a FILETIME tick count.
    #[must_use]
    pub fn filetime(&self, attribute: &str) -> Option<FileTime> {
        self.first(attribute).and_then(|value| value.parse().ok())
    }

    /// Parses every value of a DN-valued attribute such as `member` or `memberOf`.
    ///
    /// Values that fail to parse are logged and skipped.
    #[must_use]
    pub fn dn_values(&self, attribute: &str) -> Vec<DistinguishedName> {
        self.values(attribute)
            .unwrap_or_default()
            .iter()
            .filter_map(|value| match DistinguishedName::parse(value) {
                Ok(dn) => Some(dn),
                Err(err) => {
                    warn!(entry = %self.dn, attribute, "skipping unparsable DN `{value}`: {err}");
                    None
                }
            })
            .collect()
    }

    /// Decodes the entry's `objectGUID`, if it was returned.
    #[must_use]
    pub fn object_guid(&self) -> Option<ObjectGuid> {
        self.binary_values("objectGUID")
            .and_then(|values| values.first())
            .and_then(|bytes| ObjectGuid::from_directory_bytes(bytes).ok())
    }
}
