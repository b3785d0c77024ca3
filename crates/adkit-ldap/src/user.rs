//! Typed view of an Active Directory user account.

use adkit_core::{Error, FileTime, ObjectGuid};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    dn::DistinguishedName,
    entry::DirectoryEntry,
    policy::{
        AccountControl, ACCOUNT_CONTROL_ATTRIBUTE, ACCOUNT_EXPIRES_ATTRIBUTE, MANAGER_ATTRIBUTE,
    },
    resolver::EntryKind,
    session::Session,
    Result,
};

/// Read-only snapshot of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Distinguished name of the user entry.
    pub dn: DistinguishedName,
    /// Logon name (`sAMAccountName`).
    pub account_name: String,
    /// `userPrincipalName`, usually `name@domain`.
    #[serde(default)]
    pub user_principal_name: Option<String>,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Primary email address.
    #[serde(default)]
    pub mail: Option<String>,
    /// Raw `userAccountControl` flags.
    #[serde(default)]
    pub account_control: Option<AccountControl>,
    /// `accountExpires`; zero or the maximum value mean the account never expires.
    #[serde(default)]
    pub account_expires: Option<FileTime>,
    /// Distinguished name of the user's manager.
    #[serde(default)]
    pub manager: Option<DistinguishedName>,
    /// Groups the user belongs to directly.
    #[serde(default)]
    pub member_of: Vec<DistinguishedName>,
    /// Immutable object identifier.
    #[serde(default)]
    pub object_guid: Option<ObjectGuid>,
}

impl UserAccount {
    /// Builds the view from a resolved entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the entry has no `sAMAccountName` or carries a
    /// non-numeric `userAccountControl`.
    pub fn from_entry(entry: &DirectoryEntry) -> Result<Self> {
        let account_name = entry
            .first("sAMAccountName")
            .ok_or_else(|| Error::ParseError(format!("{} has no sAMAccountName", entry.dn())))?
            .to_string();

        let account_control = entry
            .first(ACCOUNT_CONTROL_ATTRIBUTE)
            .map(|raw| {
                raw.trim().parse().map(AccountControl::from_bits).map_err(|_| {
                    Error::ParseError(format!(
                        "{ACCOUNT_CONTROL_ATTRIBUTE} `{raw}` on {} is not a number",
                        entry.dn()
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            dn: entry.dn().clone(),
            account_name,
            user_principal_name: entry.first("userPrincipalName").map(str::to_string),
            display_name: entry.first("displayName").map(str::to_string),
            mail: entry.first("mail").map(str::to_string),
            account_control,
            account_expires: entry.filetime(ACCOUNT_EXPIRES_ATTRIBUTE),
            manager: entry.dn_values(MANAGER_ATTRIBUTE).into_iter().next(),
            member_of: entry.dn_values("memberOf"),
            object_guid: entry.object_guid(),
        })
    }

    /// Returns true if the disabled flag is set.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.account_control.is_some_and(AccountControl::is_disabled)
    }

    /// Returns true if the password is exempt from expiry.
    #[must_use]
    pub fn password_never_expires(&self) -> bool {
        self.account_control
            .is_some_and(AccountControl::password_never_expires)
    }

    /// Returns the expiration instant, or `None` when the account never expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.account_expires
            .filter(|expires| !expires.is_never())
            .and_then(FileTime::to_datetime)
    }

    /// Returns true if the user is a direct member of `group`.
    #[must_use]
    pub fn in_group(&self, group: &DistinguishedName) -> bool {
        self.member_of.iter().any(|dn| dn.matches(group))
    }
}

impl Session {
    /// Resolves a user and returns its typed view.
    ///
    /// # Errors
    ///
    /// Resolver errors are returned unchanged; see also [`UserAccount::from_entry`].
    pub async fn fetch_user(&mut self, account_name: &str) -> Result<UserAccount> {
        let entry = self.resolve(EntryKind::User, account_name).await?;
        UserAccount::from_entry(&entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::test_support::{entry, session};
    use crate::session::MockDirectorySession;

    const ALICE_DN: &str = "CN=alice,OU=Staff,DC=test,DC=com";

    fn alice(extra: &'static [(&'static str, &'static str)]) -> MockDirectorySession {
        let mut mock = MockDirectorySession::new();
        mock.expect_search().returning(move |_, _, _, _| {
            let mut attributes = vec![("sAMAccountName", "alice")];
            attributes.extend_from_slice(extra);
            Ok(vec![entry(ALICE_DN, &attributes)])
        });
        mock
    }

    #[tokio::test]
    async fn decodes_account_state() {
        let mock = alice(&[
            ("userPrincipalName", "alice@test.com"),
            ("displayName", "Alice Liddell"),
            ("userAccountControl", "66050"),
            ("accountExpires", "133485408000000000"),
            ("manager", "CN=bob,OU=Staff,DC=test,DC=com"),
            ("memberOf", "CN=ops,OU=Groups,DC=test,DC=com"),
        ]);

        let user = session(mock).fetch_user("alice").await.unwrap();
        assert_eq!(user.dn.as_str(), ALICE_DN);
        assert_eq!(user.account_name, "alice");
        assert_eq!(user.user_principal_name.as_deref(), Some("alice@test.com"));
        assert!(user.is_disabled());
        assert!(user.password_never_expires());
        assert_eq!(
            user.expires_at().map(|at| at.to_rfc3339()).as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
        assert_eq!(
            user.manager.as_ref().map(DistinguishedName::as_str),
            Some("CN=bob,OU=Staff,DC=test,DC=com")
        );
        let ops = DistinguishedName::parse("cn=OPS,ou=groups,dc=test,dc=com").unwrap();
        assert!(user.in_group(&ops));
    }

    #[tokio::test]
    async fn never_expiring_account() {
        let mock = alice(&[("userAccountControl", "512"), ("accountExpires", "0")]);

        let user = session(mock).fetch_user("alice").await.unwrap();
        assert!(!user.is_disabled());
        assert!(user.expires_at().is_none());
        assert!(user.member_of.is_empty());
    }

    #[tokio::test]
    async fn garbage_account_control_is_parse_error() {
        let mock = alice(&[("userAccountControl", "enabled")]);

        let result = session(mock).fetch_user("alice").await;
        assert!(matches!(result, Err(Error::ParseError(_))));
    }
}
