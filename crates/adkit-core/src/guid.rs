//! Strongly-typed wrapper for the directory's `objectGUID` attribute.
//!
//! Active Directory returns `objectGUID` as 16 raw bytes whose first three fields are stored
//! little-endian, so the byte order differs from the textual form shown by Windows tooling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Immutable identifier assigned by the directory to every object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectGuid(Uuid);

impl ObjectGuid {
    /// Creates a wrapper from a [`Uuid`].
    #[must_use]
    pub const fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Decodes the 16-byte binary attribute value returned by the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the value is not exactly 16 bytes long.
    pub fn from_directory_bytes(bytes: &[u8]) -> Result<Self> {
        Uuid::from_slice_le(bytes)
            .map(Self)
            .map_err(|err| Error::ParseError(format!("invalid objectGUID value: {err}")))
    }

    /// Encodes the GUID in the directory's binary byte order.
    #[must_use]
    pub fn to_directory_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    /// Returns the inner [`Uuid`].
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Parses a GUID from its textual form.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid GUID.
    pub fn parse_str(input: &str) -> Result<Self> {
        Uuid::parse_str(input.trim_matches(|c| c == '{' || c == '}'))
            .map(Self)
            .map_err(|_| Error::ParseError(format!("invalid GUID `{input}`")))
    }
}

impl From<Uuid> for ObjectGuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for ObjectGuid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

impl fmt::Display for ObjectGuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUID: &str = "4d36e96e-e325-11ce-bfc1-08002be10318";
    const DIRECTORY_BYTES: [u8; 16] = [
        0x6e, 0xe9, 0x36, 0x4d, 0x25, 0xe3, 0xce, 0x11, 0xbf, 0xc1, 0x08, 0x00, 0x2b, 0xe1, 0x03,
        0x18,
    ];

    #[test]
    fn decodes_mixed_endian_bytes() {
        let guid = ObjectGuid::from_directory_bytes(&DIRECTORY_BYTES).unwrap();
        assert_eq!(guid.to_string(), GUID);
        assert_eq!(guid.to_directory_bytes(), DIRECTORY_BYTES);
    }

    #[test]
    fn rejects_wrong_length() {
        let result = ObjectGuid::from_directory_bytes(&DIRECTORY_BYTES[..8]);
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn parses_braced_form() {
        let guid: ObjectGuid = format!("{{{GUID}}}").parse().unwrap();
        assert_eq!(guid, ObjectGuid::parse_str(GUID).unwrap());
        assert!("not-a-guid".parse::<ObjectGuid>().is_err());
    }
}
