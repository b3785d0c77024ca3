//! Replace-semantics attribute mutation.

use crate::{
    entry::DirectoryEntry,
    resolver::EntryKind,
    session::{DirectoryModification, Session},
    Result,
};
use adkit_core::Error;
use tracing::{debug, info};

/// Attribute holding the account password on Active Directory.
pub const PASSWORD_ATTRIBUTE: &str = "unicodePwd";

/// Replacement of an attribute's entire value set.
///
/// The directory drops every existing value of the attribute and stores exactly
/// [`AttributeEdit::values`]. Replacing with the current values has no observable effect.
#[derive(Clone, PartialEq, Eq)]
pub struct AttributeEdit {
    name: String,
    values: Vec<String>,
}

impl AttributeEdit {
    /// Replaces the attribute with a single value.
    #[must_use]
    pub fn replace(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Replaces the attribute with the given values.
    #[must_use]
    pub fn replace_all<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replacement values, before any wire encoding.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    fn is_password(&self) -> bool {
        self.name.eq_ignore_ascii_case(PASSWORD_ATTRIBUTE)
    }

    /// Converts the edit into the wire modification, encoding password values.
    pub(crate) fn into_modification(self) -> DirectoryModification {
        let values = if self.is_password() {
            self.values
                .iter()
                .map(|value| encode_password(value))
                .collect()
        } else {
            self.values.into_iter().map(String::into_bytes).collect()
        };
        DirectoryModification::Replace {
            attribute: self.name,
            values,
        }
    }
}

impl std::fmt::Debug for AttributeEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut debug = f.debug_struct("AttributeEdit");
        debug.field("name", &self.name);
        if self.is_password() {
            debug.field("values", &"[REDACTED]");
        } else {
            debug.field("values", &self.values);
        }
        debug.finish()
    }
}

/// Encodes a password the way the directory expects for `unicodePwd`: surrounded by double
/// quotes and serialized as UTF-16LE.
#[must_use]
pub fn encode_password(password: &str) -> Vec<u8> {
    format!("\"{password}\"")
        .encode_utf16()
        .flat_map(u16::to_le_bytes)
        .collect()
}

impl Session {
    /// Replaces an attribute on an already resolved entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModifyFailed`] with the server's message if the modification is
    /// rejected or the transport fails.
    pub async fn replace_attribute(
        &mut self,
        entry: &DirectoryEntry,
        edit: AttributeEdit,
    ) -> Result<()> {
        let dn = entry.dn().as_str();
        let attribute = edit.name().to_string();
        debug!(dn, attribute = %attribute, "replacing attribute");

        self.transport()
            .modify(dn, &[edit.into_modification()])
            .await
            .map_err(|err| {
                Error::ModifyFailed(format!("{attribute} on {dn}: {}", err.detail()))
            })?;

        info!(dn, attribute = %attribute, "attribute replaced");
        Ok(())
    }

    /// Resolves an entry and replaces one of its attributes with a single value.
    ///
    /// # Errors
    ///
    /// Resolver errors are returned unchanged; a rejected modification is
    /// [`Error::ModifyFailed`].
    pub async fn modify_entry(
        &mut self,
        kind: EntryKind,
        identifier: &str,
        attribute: &str,
        value: &str,
    ) -> Result<()> {
        let entry = self.resolve(kind, identifier).await?;
        self.replace_attribute(&entry, AttributeEdit::replace(attribute, value))
            .await
    }

    /// Replaces an attribute on the user with the given account name.
    ///
    /// # Errors
    ///
    /// See [`Session::modify_entry`].
    pub async fn modify_user(
        &mut self,
        account_name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<()> {
        self.modify_entry(EntryKind::User, account_name, attribute, value)
            .await
    }

    /// Replaces an attribute on the group with the given account name.
    ///
    /// # Errors
    ///
    /// See [`Session::modify_entry`].
    pub async fn modify_group(
        &mut self,
        account_name: &str,
        attribute: &str,
        value: &str,
    ) -> Result<()> {
        self.modify_entry(EntryKind::Group, account_name, attribute, value)
            .await
    }
}
