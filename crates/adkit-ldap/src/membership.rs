//! Group membership management.
//!
//! Membership is stored on the group as DN values of its `member` attribute. A member can be a
//! user or another group; nesting cycles are left for the server to accept or reject.

use crate::{
    dn::DistinguishedName,
    resolver::EntryKind,
    session::{DirectoryModification, Session},
    Result,
};
use adkit_core::Error;
use std::fmt;
use tracing::{debug, info};

/// Attribute listing a group's members.
pub const MEMBER_ATTRIBUTE: &str = "member";

/// Direction of a membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipOperation {
    /// Add the member to the group.
    Add,
    /// Remove the member from the group.
    Remove,
}

impl fmt::Display for MembershipOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Remove => "remove",
        })
    }
}

/// A membership change between two already known entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipEdit {
    /// Group whose `member` attribute changes.
    pub group_dn: DistinguishedName,
    /// User or group being added or removed.
    pub member_dn: DistinguishedName,
    /// Whether to add or remove the member.
    pub operation: MembershipOperation,
}

impl MembershipEdit {
    fn modification(&self) -> DirectoryModification {
        let attribute = MEMBER_ATTRIBUTE.to_string();
        let values = vec![self.member_dn.as_str().as_bytes().to_vec()];
        match self.operation {
            MembershipOperation::Add => DirectoryModification::Add { attribute, values },
            MembershipOperation::Remove => DirectoryModification::Delete { attribute, values },
        }
    }
}

impl Session {
    /// Applies a membership change between two known DNs.
    ///
    /// Membership state is not checked first: adding an existing member or removing an absent
    /// one is reported however the server reports it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModifyFailed`] carrying the server's message on rejection.
    pub async fn apply_membership(&mut self, edit: &MembershipEdit) -> Result<()> {
        let group = edit.group_dn.as_str();
        let member = edit.member_dn.as_str();
        debug!(group, member, operation = %edit.operation, "changing group membership");

        self.transport()
            .modify(group, &[edit.modification()])
            .await
            .map_err(|err| {
                Error::ModifyFailed(format!(
                    "{} {member} in {group}: {}",
                    edit.operation,
                    err.detail()
                ))
            })?;

        info!(group, member, operation = %edit.operation, "group membership changed");
        Ok(())
    }

    async fn change_membership(
        &mut self,
        member_kind: EntryKind,
        member: &str,
        group: &str,
        operation: MembershipOperation,
    ) -> Result<()> {
        let member_entry = self.resolve(member_kind, member).await?;
        let group_entry = self.find_group(group).await?;
        let edit = MembershipEdit {
            group_dn: group_entry.dn().clone(),
            member_dn: member_entry.dn().clone(),
            operation,
        };
        self.apply_membership(&edit).await
    }

    /// Adds a user to a group.
    ///
    /// # Errors
    ///
    /// Resolver errors for either side are returned unchanged; a rejected change is
    /// [`Error::ModifyFailed`].
    pub async fn add_user_to_group(&mut self, user: &str, group: &str) -> Result<()> {
        self.change_membership(EntryKind::User, user, group, MembershipOperation::Add)
            .await
    }

    /// Removes a user from a group.
    ///
    /// # Errors
    ///
    /// See [`Session::add_user_to_group`].
    pub async fn remove_user_from_group(&mut self, user: &str, group: &str) -> Result<()> {
        self.change_membership(EntryKind::User, user, group, MembershipOperation::Remove)
            .await
    }

    /// Nests `member_group` inside `group`.
    ///
    /// # Errors
    ///
    /// See [`Session::add_user_to_group`].
    pub async fn add_group_to_group(&mut self, member_group: &str, group: &str) -> Result<()> {
        self.change_membership(EntryKind::Group, member_group, group, MembershipOperation::Add)
            .await
    }

    /// Removes the nested `member_group` from `group`.
    ///
    /// # Errors
    ///
    /// See [`Session::add_user_to_group`].
    pub async fn remove_group_from_group(&mut self, member_group: &str, group: &str) -> Result<()> {
        self.change_membership(
            EntryKind::Group,
            member_group,
            group,
            MembershipOperation::Remove,
        )
        .await
    }

    /// Lists the DNs stored in a group's `member` attribute.
    ///
    /// # Errors
    ///
    /// See [`Session::resolve`].
    pub async fn group_members(&mut self, group: &str) -> Result<Vec<DistinguishedName>> {
        let entry = self.find_group(group).await?;
        Ok(entry.dn_values(MEMBER_ATTRIBUTE))
    }
}
