//! Account policy operations.
//!
//! Each operation is a fixed attribute replacement on a user account.
//!
//! Enabling, disabling and the password-expiry toggle all write `userAccountControl` and
//! overwrite each other: disabling an account whose password never expires leaves it at
//! [`AccountControl::DISABLED`], clearing the never-expires bit. Callers who need a combined
//! state write the exact value with [`Session::modify_user`].

use crate::{
    mutator::{AttributeEdit, PASSWORD_ATTRIBUTE},
    resolver::EntryKind,
    session::Session,
    Result,
};
use adkit_core::{timestamp, Error, FileTime};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attribute carrying the account state flags.
pub const ACCOUNT_CONTROL_ATTRIBUTE: &str = "userAccountControl";
/// Attribute carrying the account expiration as a FILETIME.
pub const ACCOUNT_EXPIRES_ATTRIBUTE: &str = "accountExpires";
/// Attribute carrying the DN of the user's manager.
pub const MANAGER_ATTRIBUTE: &str = "manager";

/// Value of the `userAccountControl` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountControl(u32);

impl AccountControl {
    /// Normal, enabled account.
    pub const ENABLED: Self = Self(512);
    /// Normal account with the disabled flag set.
    pub const DISABLED: Self = Self(514);
    /// Normal account whose password never expires.
    pub const PASSWORD_NEVER_EXPIRES: Self = Self(66_048);
    /// Normal account whose password follows the domain expiry policy.
    pub const PASSWORD_EXPIRES: Self = Self(512);

    const ACCOUNTDISABLE: u32 = 0x0002;
    const DONT_EXPIRE_PASSWORD: u32 = 0x0001_0000;

    /// Wraps a raw flag value.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw flag value.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True when the disabled flag is set.
    #[must_use]
    pub const fn is_disabled(self) -> bool {
        self.0 & Self::ACCOUNTDISABLE != 0
    }

    /// True when the password is exempt from expiry.
    #[must_use]
    pub const fn password_never_expires(self) -> bool {
        self.0 & Self::DONT_EXPIRE_PASSWORD != 0
    }
}

impl fmt::Display for AccountControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Session {
    async fn replace_on_user(&mut self, account_name: &str, edit: AttributeEdit) -> Result<()> {
        let entry = self.resolve(EntryKind::User, account_name).await?;
        self.replace_attribute(&entry, edit).await
    }

    async fn write_account_control(
        &mut self,
        account_name: &str,
        value: AccountControl,
    ) -> Result<()> {
        self.replace_on_user(
            account_name,
            AttributeEdit::replace(ACCOUNT_CONTROL_ATTRIBUTE, value.to_string()),
        )
        .await
    }

    /// Enables the account by writing [`AccountControl::ENABLED`].
    ///
    /// # Errors
    ///
    /// Resolver errors are returned unchanged; a rejected write is
    /// [`adkit_core::Error::ModifyFailed`].
    pub async fn enable_account(&mut self, account_name: &str) -> Result<()> {
        self.write_account_control(account_name, AccountControl::ENABLED)
            .await
    }

    /// Disables the account by writing [`AccountControl::DISABLED`], whatever the prior value.
    ///
    /// # Errors
    ///
    /// See [`Session::enable_account`].
    pub async fn disable_account(&mut self, account_name: &str) -> Result<()> {
        self.write_account_control(account_name, AccountControl::DISABLED)
            .await
    }

    /// Sets or clears the password-never-expires state.
    ///
    /// # Errors
    ///
    /// See [`Session::enable_account`].
    pub async fn set_password_never_expires(
        &mut self,
        account_name: &str,
        never_expires: bool,
    ) -> Result<()> {
        let value = if never_expires {
            AccountControl::PASSWORD_NEVER_EXPIRES
        } else {
            AccountControl::PASSWORD_EXPIRES
        };
        self.write_account_control(account_name, value).await
    }

    /// Sets the account expiration from a `YYYY-M-D HH:MM:SS` UTC string.
    ///
    /// `1601-1-1 00:00:00` encodes to tick 0, which the directory reads as "never expires", so
    /// it is rejected; use [`Session::clear_account_expiration`] for that.
    ///
    /// # Errors
    ///
    /// Returns [`adkit_core::Error::ParseError`] before any request is sent when the date is
    /// unparsable, does not fit in 18 digits, or encodes to tick 0; otherwise see
    /// [`Session::enable_account`].
    pub async fn set_account_expiration(&mut self, account_name: &str, when: &str) -> Result<()> {
        let encoded = timestamp::encode(when)?;
        if encoded.parse::<FileTime>()? == FileTime::NEVER {
            return Err(Error::ParseError(format!(
                "`{when}` encodes to the never-expires sentinel"
            )));
        }
        self.replace_on_user(
            account_name,
            AttributeEdit::replace(ACCOUNT_EXPIRES_ATTRIBUTE, encoded),
        )
        .await
    }

    /// Removes the account expiration.
    ///
    /// # Errors
    ///
    /// See [`Session::enable_account`].
    pub async fn clear_account_expiration(&mut self, account_name: &str) -> Result<()> {
        self.replace_on_user(
            account_name,
            AttributeEdit::replace(
                ACCOUNT_EXPIRES_ATTRIBUTE,
                FileTime::NEVER.ticks().to_string(),
            ),
        )
        .await
    }

    /// Points the user's `manager` at another user.
    ///
    /// The manager is resolved first, so a missing manager leaves the user untouched.
    ///
    /// # Errors
    ///
    /// See [`Session::enable_account`].
    pub async fn set_manager(&mut self, account_name: &str, manager: &str) -> Result<()> {
        let manager = self.resolve(EntryKind::User, manager).await?;
        self.replace_on_user(
            account_name,
            AttributeEdit::replace(MANAGER_ATTRIBUTE, manager.dn().as_str()),
        )
        .await
    }

    /// Sets a new password. The server must accept the request over an encrypted connection.
    ///
    /// # Errors
    ///
    /// See [`Session::enable_account`]. Password complexity rejections arrive as
    /// [`adkit_core::Error::ModifyFailed`].
    pub async fn reset_password(
        &mut self,
        account_name: &str,
        password: &SecretString,
    ) -> Result<()> {
        self.replace_on_user(
            account_name,
            AttributeEdit::replace(PASSWORD_ATTRIBUTE, password.expose_secret()),
        )
        .await
    }
}
