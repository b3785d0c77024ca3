//! Active Directory entry resolution and mutation over LDAPS.
//!
//! A [`DirectoryClient`] turns a [`DirectoryConfig`] into an authenticated [`Session`]. Every
//! operation on the session first resolves exactly one entry by identifier and only then
//! issues a modification, add or modify-DN request against that entry's DN.

#![deny(missing_docs)]

mod client;
mod config;
mod dn;
mod entry;
mod group;
mod hierarchy;
mod membership;
mod mutator;
mod policy;
mod resolver;
mod session;
mod user;

pub use client::{DirectoryClient, Ldap3Connector, LdapConnector};
pub use config::{DirectoryConfig, DEFAULT_CONNECTION_TIMEOUT_SECS, DEFAULT_LDAPS_PORT};
pub use dn::{DistinguishedName, DistinguishedNameError, RelativeDistinguishedName};
pub use entry::DirectoryEntry;
pub use group::Group;
pub use membership::{MembershipEdit, MembershipOperation, MEMBER_ATTRIBUTE};
pub use mutator::{encode_password, AttributeEdit, PASSWORD_ATTRIBUTE};
pub use policy::{
    AccountControl, ACCOUNT_CONTROL_ATTRIBUTE, ACCOUNT_EXPIRES_ATTRIBUTE, MANAGER_ATTRIBUTE,
};
pub use resolver::EntryKind;
pub use session::{
    DirectoryModification, DirectorySession, LdapAttribute, LdapEntry, SearchScope, Session,
};
pub use user::UserAccount;

pub use adkit_core::{timestamp, Error, FileTime, ObjectGuid};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = adkit_core::Result<T>;
