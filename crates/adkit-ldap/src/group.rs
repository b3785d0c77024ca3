//! Typed view of a directory group.

use adkit_core::{Error, ObjectGuid};
use serde::{Deserialize, Serialize};

use crate::{
    dn::DistinguishedName, entry::DirectoryEntry, membership::MEMBER_ATTRIBUTE,
    resolver::EntryKind, session::Session, Result,
};

/// Read-only snapshot of a group entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Distinguished name of the group.
    pub dn: DistinguishedName,
    /// Group account name (`sAMAccountName`).
    pub account_name: String,
    /// Optional display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Distinguished names of direct members, users and nested groups alike.
    #[serde(default)]
    pub members: Vec<DistinguishedName>,
    /// Immutable object identifier.
    #[serde(default)]
    pub object_guid: Option<ObjectGuid>,
}

impl Group {
    /// Builds the view from a resolved entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the entry has no `sAMAccountName`.
    pub fn from_entry(entry: &DirectoryEntry) -> Result<Self> {
        let account_name = entry
            .first("sAMAccountName")
            .ok_or_else(|| Error::ParseError(format!("{} has no sAMAccountName", entry.dn())))?;

        Ok(Self {
            dn: entry.dn().clone(),
            account_name: account_name.to_string(),
            display_name: entry.first("displayName").map(str::to_string),
            description: entry.first("description").map(str::to_string),
            members: entry.dn_values(MEMBER_ATTRIBUTE),
            object_guid: entry.object_guid(),
        })
    }

    /// Returns the number of direct members.
    #[must_use]
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Checks whether the given distinguished name is a direct member.
    #[must_use]
    pub fn has_member(&self, member_dn: &DistinguishedName) -> bool {
        self.members.iter().any(|dn| dn.matches(member_dn))
    }
}

impl Session {
    /// Resolves a group and returns its typed view.
    ///
    /// # Errors
    ///
    /// Resolver errors are returned unchanged; see also [`Group::from_entry`].
    pub async fn fetch_group(&mut self, account_name: &str) -> Result<Group> {
        let entry = self.resolve(EntryKind::Group, account_name).await?;
        Group::from_entry(&entry)
    }
}
