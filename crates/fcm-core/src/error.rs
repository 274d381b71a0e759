//! # Validation Errors
//!
//! Errors raised when a domain primitive is constructed from untrusted
//! input. Each variant carries the rejected value so operators can see
//! what was submitted.

use thiserror::Error;

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// User identifier is empty or whitespace.
    #[error("invalid user ID: must be non-empty")]
    EmptyUserId,

    /// Evidence or case identifier is not a UUID.
    #[error("invalid {kind} ID: \"{value}\" (expected a UUID)")]
    InvalidUuid {
        /// Which identifier namespace was being parsed.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },

    /// Timestamp string is not valid RFC 3339.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp {
        /// The string that failed to parse.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}
