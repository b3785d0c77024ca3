//! # adkit-core
//!
//! Core types and utilities shared by the adkit directory crates.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and structured error responses
//! - [`timestamp`] - FILETIME tick counts and calendar-string conversion
//! - [`guid`] - `objectGUID` wrapper

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod guid;
pub mod timestamp;

// Re-export commonly used types
pub use error::{Error, Result};
pub use guid::ObjectGuid;
pub use timestamp::FileTime;
