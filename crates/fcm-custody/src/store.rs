//! # Collaborator Seams
//!
//! The ledger owns no storage. It talks to three injected collaborators:
//!
//! - [`RecordStore`]: creates evidence records at intake, then reads and
//!   writes their custody slice (`custody_log`, `collected_by`,
//!   `collected_at`).
//! - [`IdentityResolver`]: batched lookup of display identities.
//! - [`ActorProvider`]: the currently authenticated user, if any.
//!
//! All three are object-safe (`async_trait`) so they can be shared as
//! `Arc<dyn _>` and replaced by test doubles.
//!
//! ## Versioning
//!
//! A store may return an opaque [`RecordVersion`] with each read and honour
//! `expected_version` on write (compare-and-swap). A store that cannot
//! version returns `None` and ignores the expectation; writes to such a
//! store are last-write-wins.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use fcm_core::{CaseId, EvidenceId, Timestamp, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::StoredEntry;
use crate::intake::DeviceProfile;

/// Opaque version token of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordVersion(String);

impl RecordVersion {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The custody slice of an evidence record as read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyRecord {
    /// Stored log, oldest first, entries as persisted. May be empty.
    pub custody_log: Vec<StoredEntry>,
    /// User who originally collected the item.
    pub collected_by: UserId,
    /// When the item was originally collected.
    pub collected_at: Timestamp,
    /// Version token, when the store supports conditional writes.
    pub version: Option<RecordVersion>,
}

/// A full replacement of the stored custody log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyWrite {
    pub custody_log: Vec<StoredEntry>,
    pub updated_at: Timestamp,
    /// Apply only if the stored version still equals this token.
    pub expected_version: Option<RecordVersion>,
}

/// An evidence record as created at intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvidence {
    pub case_id: CaseId,
    /// Human-facing number, e.g. `EVD-1760000000123`.
    pub evidence_number: String,
    /// Kind of item, e.g. `Mobile Device`.
    pub evidence_type: String,
    pub description: String,
    pub collected_by: UserId,
    pub collected_at: Timestamp,
    /// Identity of the acquired device, for device acquisitions.
    pub device: Option<DeviceProfile>,
    /// Initial custody log.
    pub custody_log: Vec<StoredEntry>,
}

/// Result of a [`RecordStore::set`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The log was replaced.
    Written,
    /// `expected_version` no longer matched; nothing was written.
    VersionConflict,
    /// The record no longer exists; nothing was written.
    Missing,
}

/// Display identity of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorProfile {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// Failures reported by collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The store answered with an error status.
    #[error("store rejected request with status {status}: {body}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The stored data could not be decoded.
    #[error("malformed record: {0}")]
    Malformed(String),
}

/// Read/write access to the custody slice of evidence records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create an evidence record and return its assigned id.
    async fn create(&self, record: NewEvidence) -> Result<EvidenceId, StoreError>;

    /// Fetch the custody slice, or `None` if the evidence id is unknown.
    async fn get(&self, evidence_id: &EvidenceId) -> Result<Option<CustodyRecord>, StoreError>;

    /// Replace the stored custody log.
    async fn set(
        &self,
        evidence_id: &EvidenceId,
        write: CustodyWrite,
    ) -> Result<WriteOutcome, StoreError>;
}

/// Batched display-identity lookup.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve the given ids. Ids with no profile are simply absent from
    /// the returned map.
    async fn resolve_many(
        &self,
        ids: &BTreeSet<UserId>,
    ) -> Result<HashMap<UserId, ActorProfile>, StoreError>;
}

/// Source of the currently authenticated user.
#[async_trait]
pub trait ActorProvider: Send + Sync {
    async fn current_actor(&self) -> Option<UserId>;
}
