//! Conversion between calendar strings and Active Directory FILETIME tick counts.
//!
//! Expiration attributes such as `accountExpires` store an integer count of 100-nanosecond
//! intervals since 1601-01-01T00:00:00Z. Calendar strings use the `YYYY-M-D HH:MM:SS` layout
//! (month and day may be one or two digits) and are always interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Number of ticks between 1601-01-01 and the Unix epoch (1970-01-01).
pub const EPOCH_OFFSET_TICKS: u64 = 116_444_736_000_000_000;

/// Number of 100-nanosecond ticks in one second.
pub const TICKS_PER_SECOND: u64 = 10_000_000;

/// Width of an encoded tick count.
pub const ENCODED_WIDTH: usize = 18;

const MAX_ENCODED_TICKS: u64 = 999_999_999_999_999_999;
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DISPLAY_FORMAT: &str = "%Y-%-m-%-d %H:%M:%S";

/// A point in time expressed as 100-nanosecond ticks since 1601-01-01T00:00:00Z.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileTime(u64);

impl FileTime {
    /// The value written to clear an account expiration.
    pub const NEVER: Self = Self(0);

    /// Wraps a raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self(ticks)
    }

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Returns true for the two values the directory uses to mean "never expires".
    #[must_use]
    pub const fn is_never(self) -> bool {
        self.0 == 0 || self.0 == i64::MAX as u64
    }

    /// Converts a UTC instant to ticks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] for instants before 1601-01-01.
    pub fn from_datetime(instant: DateTime<Utc>) -> Result<Self> {
        let since_1601 = i128::from(instant.timestamp()) * i128::from(TICKS_PER_SECOND)
            + i128::from(instant.timestamp_subsec_nanos() / 100)
            + i128::from(EPOCH_OFFSET_TICKS);

        u64::try_from(since_1601)
            .map(Self)
            .map_err(|_| Error::ParseError(format!("{instant} is outside the FILETIME range")))
    }

    /// Converts the tick count to a UTC instant.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        let secs_since_1601 = i64::try_from(self.0 / TICKS_PER_SECOND).ok()?;
        let offset_secs = i64::try_from(EPOCH_OFFSET_TICKS / TICKS_PER_SECOND).ok()?;
        let nanos = u32::try_from((self.0 % TICKS_PER_SECOND) * 100).ok()?;
        DateTime::from_timestamp(secs_since_1601 - offset_secs, nanos)
    }

    /// Parses a `YYYY-M-D HH:MM:SS` calendar string (UTC).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParseError`] if the string is malformed or names an instant before
    /// 1601-01-01.
    pub fn from_calendar(calendar: &str) -> Result<Self> {
        let naive = NaiveDateTime::parse_from_str(calendar.trim(), PARSE_FORMAT).map_err(|err| {
            Error::ParseError(format!("invalid calendar timestamp `{calendar}`: {err}"))
        })?;
        Self::from_datetime(naive.and_utc())
    }

    /// Renders the instant as `YYYY-M-D HH:MM:SS` (UTC), truncating sub-second ticks.
    #[must_use]
    pub fn to_calendar(self) -> String {
        // Every u64 tick count lies well inside chrono's representable range.
        self.to_datetime()
            .map(|instant| instant.format(DISPLAY_FORMAT).to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for FileTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$}", self.0, width = ENCODED_WIDTH)
    }
}

impl FromStr for FileTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|err| Error::ParseError(format!("invalid tick count `{s}`: {err}")))
    }
}

impl From<u64> for FileTime {
    fn from(ticks: u64) -> Self {
        Self(ticks)
    }
}

/// Encodes a calendar string as an 18-digit, zero-padded tick count.
///
/// # Errors
///
/// Returns [`Error::ParseError`] if the string is malformed, precedes 1601-01-01, or lies so far
/// in the future that the tick count no longer fits in 18 digits.
pub fn encode(calendar: &str) -> Result<String> {
    let filetime = FileTime::from_calendar(calendar)?;
    if filetime.ticks() > MAX_ENCODED_TICKS {
        return Err(Error::ParseError(format!(
            "`{calendar}` does not fit in {ENCODED_WIDTH} digits"
        )));
    }
    Ok(filetime.to_string())
}

/// Decodes a tick count into a `YYYY-M-D HH:MM:SS` calendar string.
#[must_use]
pub fn decode(ticks: u64) -> String {
    FileTime::from_ticks(ticks).to_calendar()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn unix_epoch_encodes_to_offset() {
        assert_eq!(encode("1970-1-1 00:00:00").unwrap(), "116444736000000000");
        assert_eq!(decode(EPOCH_OFFSET_TICKS), "1970-1-1 00:00:00");
    }

    #[test]
    fn encode_is_fixed_width() {
        for calendar in [
            "1601-1-1 00:00:00",
            "1601-1-1 00:00:01",
            "1700-6-15 08:00:00",
            "2024-12-31 23:59:59",
            "4000-1-1 00:00:00",
        ] {
            let encoded = encode(calendar).unwrap();
            assert_eq!(encoded.len(), ENCODED_WIDTH, "{calendar} -> {encoded}");
            assert!(encoded.chars().all(|c| c.is_ascii_digit()));
        }
        assert_eq!(encode("1601-1-1 00:00:00").unwrap(), "000000000000000000");
    }

    #[test]
    fn decode_reverses_encode() {
        for calendar in ["2024-3-5 12:30:45", "1999-12-31 23:59:59", "2038-1-19 03:14:08"] {
            let ticks: u64 = encode(calendar).unwrap().parse().unwrap();
            assert_eq!(decode(ticks), calendar);
        }
    }

    #[test]
    fn encode_accepts_zero_padded_fields() {
        assert_eq!(
            encode("2024-03-05 12:30:45").unwrap(),
            encode("2024-3-5 12:30:45").unwrap()
        );
    }

    #[test]
    fn decode_truncates_sub_second_ticks() {
        assert_eq!(
            decode(EPOCH_OFFSET_TICKS + TICKS_PER_SECOND - 1),
            "1970-1-1 00:00:00"
        );
    }

    #[test]
    fn malformed_calendar_is_parse_error() {
        for bad in ["", "yesterday", "2024-13-01 00:00:00", "2024-1-1", "2024-2-30 00:00:00"] {
            assert!(
                matches!(encode(bad), Err(Error::ParseError(_))),
                "`{bad}` should not parse"
            );
        }
    }

    #[test]
    fn out_of_range_calendar_is_parse_error() {
        assert!(matches!(
            encode("1600-12-31 23:59:59"),
            Err(Error::ParseError(_))
        ));
        assert!(matches!(
            encode("5000-1-1 00:00:00"),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn datetime_conversion_keeps_sub_second_precision() {
        let instant = Utc.with_ymd_and_hms(2020, 2, 29, 6, 7, 8).unwrap()
            + chrono::Duration::milliseconds(250);
        let filetime = FileTime::from_datetime(instant).unwrap();
        assert_eq!(filetime.to_datetime(), Some(instant));
    }

    #[test]
    fn never_sentinels() {
        assert!(FileTime::from_ticks(0).is_never());
        assert!("9223372036854775807".parse::<FileTime>().unwrap().is_never());
        assert!(!FileTime::from_ticks(EPOCH_OFFSET_TICKS).is_never());
    }

    #[test]
    fn display_and_parse() {
        let filetime: FileTime = "132000000000000000".parse().unwrap();
        assert_eq!(filetime.ticks(), 132_000_000_000_000_000);
        assert_eq!(FileTime::from_ticks(42).to_string(), "000000000000000042");
        assert!(matches!(
            "12ab".parse::<FileTime>(),
            Err(Error::ParseError(_))
        ));
    }
}
