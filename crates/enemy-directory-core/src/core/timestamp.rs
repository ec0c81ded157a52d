// crates/enemy-directory-core/src/core/timestamp.rs
// ============================================================================
// Module: Enemy Directory Time Model
// Description: UTC instant recorded as a record's last modification time.
// Purpose: Provide a comparable timestamp with a stable RFC 3339 wire form.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Every record carries the instant it was last written. The store reads that
//! instant from an injected [`crate::Clock`]; callers never supply it.
//! Timestamps are normalized to UTC and serialize as RFC 3339 strings such as
//! `2021-12-31T14:59:05Z`, which is also the form persisted in SQLite.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de;
use serde::ser;
use thiserror::Error;
use time::OffsetDateTime;
use time::UtcOffset;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while converting timestamps to or from text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimestampError {
    /// Text is not a valid RFC 3339 timestamp.
    #[error("invalid rfc3339 timestamp: {0}")]
    Parse(String),
    /// Timestamp cannot be represented in RFC 3339.
    #[error("timestamp formatting failed: {0}")]
    Format(String),
    /// Unix nanosecond value is out of range.
    #[error("timestamp out of range: {0}")]
    OutOfRange(String),
}

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Last-modification instant of an enemy record.
///
/// # Invariants
/// - Always stored with a UTC offset.
/// - Ordering follows the underlying instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps a date-time, normalizing it to UTC.
    #[must_use]
    pub fn from_datetime(value: OffsetDateTime) -> Self {
        Self(value.to_offset(UtcOffset::UTC))
    }

    /// Builds a timestamp from nanoseconds since the unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::OutOfRange`] when the value cannot be represented.
    pub fn from_unix_nanos(nanos: i128) -> Result<Self, TimestampError> {
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .map(Self::from_datetime)
            .map_err(|err| TimestampError::OutOfRange(err.to_string()))
    }

    /// Parses an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Parse`] when the text is not RFC 3339.
    pub fn parse_rfc3339(text: &str) -> Result<Self, TimestampError> {
        OffsetDateTime::parse(text, &Rfc3339)
            .map(Self::from_datetime)
            .map_err(|err| TimestampError::Parse(format!("{text}: {err}")))
    }

    /// Formats the timestamp as RFC 3339 with a `Z` suffix.
    ///
    /// # Errors
    ///
    /// Returns [`TimestampError::Format`] when the year falls outside RFC 3339.
    pub fn to_rfc3339(&self) -> Result<String, TimestampError> {
        self.0.format(&Rfc3339).map_err(|err| TimestampError::Format(err.to_string()))
    }

    /// Returns the underlying UTC date-time.
    #[must_use]
    pub const fn as_datetime(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns nanoseconds since the unix epoch.
    #[must_use]
    pub const fn unix_nanos(&self) -> i128 {
        self.0.unix_timestamp_nanos()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self.to_rfc3339().map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = self.to_rfc3339().map_err(ser::Error::custom)?;
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse_rfc3339(&text).map_err(de::Error::custom)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
