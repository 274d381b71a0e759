//! # Ledger Errors
//!
//! Every failure of a ledger operation is propagated to the caller. The
//! ledger performs no local recovery for store failures; a version conflict
//! under compare-and-swap is the only condition it re-attempts, and running
//! out of attempts surfaces as [`LedgerError::Conflict`].
//!
//! Identity-resolution misses are not errors and never appear here.

use fcm_core::EvidenceId;
use thiserror::Error;

use crate::store::StoreError;

/// Errors from [`crate::CustodyLedger`] operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Missing or empty required input.
    #[error("validation error: {0}")]
    Validation(String),

    /// No authenticated actor.
    #[error("not authenticated: {0}")]
    Auth(String),

    /// The evidence id does not resolve to an evidence record.
    #[error("evidence {0} not found")]
    NotFound(EvidenceId),

    /// The underlying record store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Every compare-and-swap attempt lost to a concurrent writer.
    #[error("custody log of evidence {evidence_id} changed concurrently; gave up after {attempts} attempts")]
    Conflict {
        /// Evidence whose log kept changing.
        evidence_id: EvidenceId,
        /// Number of append attempts made.
        attempts: u32,
    },
}

impl From<fcm_core::ValidationError> for LedgerError {
    fn from(err: fcm_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}
