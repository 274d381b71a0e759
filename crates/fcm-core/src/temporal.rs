//! # Temporal Types: UTC-Only Timestamps
//!
//! Defines `Timestamp`, the point-in-time type used for custody events and
//! record bookkeeping.
//!
//! ## Invariants
//!
//! - Always UTC. Inputs carrying an offset are converted on parse, so two
//!   spellings of the same instant compare equal.
//! - Rendered as ISO-8601 with a `Z` suffix. Fractional seconds are printed
//!   only when present (`2026-01-15T12:00:00Z`, `2026-01-15T12:00:00.250Z`),
//!   so an instant read from storage serializes back to the same instant
//!   without gaining or losing precision.
//! - [`Timestamp::now()`] records at millisecond precision, the resolution
//!   the web client historically wrote.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A UTC timestamp.
///
/// # Construction
///
/// - [`Timestamp::now()`]: current UTC time at millisecond precision.
/// - [`Timestamp::from_utc()`]: from a `DateTime<Utc>`, unchanged.
/// - [`Timestamp::parse()`]: from an RFC 3339 string with any offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current UTC time, truncated to milliseconds.
    pub fn now() -> Self {
        Self(Utc::now().trunc_subsecs(3))
    }

    /// Wrap a `chrono::DateTime<Utc>`.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an RFC 3339 / ISO-8601 string, converting any offset to UTC.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidTimestamp`] if the string is not
    /// valid RFC 3339.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let dt = DateTime::parse_from_rfc3339(s.trim()).map_err(|e| {
            ValidationError::InvalidTimestamp {
                value: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self(dt.with_timezone(&Utc)))
    }

    /// Create a timestamp from Unix epoch milliseconds.
    pub fn from_epoch_millis(millis: i64) -> Result<Self, ValidationError> {
        DateTime::from_timestamp_millis(millis)
            .map(Self)
            .ok_or_else(|| ValidationError::InvalidTimestamp {
                value: millis.to_string(),
                reason: "out of range for a UTC timestamp".to_string(),
            })
    }

    /// Access the inner `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch timestamp in milliseconds.
    pub fn epoch_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Render as ISO-8601 with `Z` suffix.
    pub fn to_iso8601(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    /// Render for operator display, e.g. `Jan 5, 2026 14:03` (UTC).
    pub fn to_display(&self) -> String {
        self.0.format("%b %-d, %Y %H:%M").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Timestamp::parse(&raw).map_err(serde::de::Error::custom)
    }
}
