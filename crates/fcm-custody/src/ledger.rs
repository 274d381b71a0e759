//! # Custody Ledger
//!
//! Intake, append and read operations over the custody log of an evidence
//! item.
//!
//! ## Intake
//!
//! A new evidence record is created with a single collection entry
//! performed by the registering user.
//!
//! ## Append
//!
//! An append reads the stored log, builds one new event stamped with the
//! current time, and writes the log back with the event at the end. No
//! reordering, no dedup, no merge. Earlier entries are written back exactly
//! as they were read; only the new entry is encoded.
//!
//! The read-modify-write replaces the whole log, so two overlapping appends
//! can both read length N and both write N+1. Under
//! [`ConcurrencyMode::LastWriteWins`] the second write silently discards
//! the first event. [`ConcurrencyMode::CompareAndSwap`] makes the write
//! conditional on the version read; a conflict re-reads and re-appends.
//! Stores that report no version cannot be guarded and fall back to
//! last-write-wins.
//!
//! ## Read
//!
//! An empty stored log reads as a single synthetic collection entry built
//! from the record's collector and collection time. It is derived on every
//! read and never written back.

use std::collections::BTreeSet;
use std::sync::Arc;

use fcm_core::{EvidenceId, Timestamp, UserId};

use crate::action::CustodyAction;
use crate::error::LedgerError;
use crate::event::{CustodyEvent, EntryDetails, StoredEntry};
use crate::intake::{EvidenceIntake, RegisteredEvidence};
use crate::store::{
    ActorProvider, CustodyRecord, CustodyWrite, IdentityResolver, RecordStore, StoreError,
    WriteOutcome,
};
use crate::timeline::{ResolvedActor, Timeline, TimelineEntry};

/// Default number of compare-and-swap attempts per append.
pub const DEFAULT_CAS_ATTEMPTS: u32 = 5;

/// How appends guard against concurrent writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcurrencyMode {
    /// Unconditional write. Overlapping appends can lose events.
    LastWriteWins,
    /// Conditional write on the version read, re-attempted on conflict.
    CompareAndSwap {
        /// Total attempts before giving up with [`LedgerError::Conflict`].
        max_attempts: u32,
    },
}

impl Default for ConcurrencyMode {
    fn default() -> Self {
        Self::CompareAndSwap {
            max_attempts: DEFAULT_CAS_ATTEMPTS,
        }
    }
}

/// The chain-of-custody ledger.
#[derive(Clone)]
pub struct CustodyLedger {
    store: Arc<dyn RecordStore>,
    identities: Arc<dyn IdentityResolver>,
    mode: ConcurrencyMode,
}

impl std::fmt::Debug for CustodyLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyLedger")
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CustodyLedger {
    /// Create a ledger using compare-and-swap appends.
    pub fn new(store: Arc<dyn RecordStore>, identities: Arc<dyn IdentityResolver>) -> Self {
        Self {
            store,
            identities,
            mode: ConcurrencyMode::default(),
        }
    }

    /// Override the concurrency mode.
    pub fn with_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ConcurrencyMode {
        self.mode
    }

    /// Record a new evidence item collected by `actor` now.
    ///
    /// The record starts with a single collection entry. Fails with
    /// [`LedgerError::Validation`] for a blank type or description and
    /// [`LedgerError::Auth`] without an actor; nothing is created then.
    pub async fn register_evidence(
        &self,
        intake: EvidenceIntake,
        actor: Option<&UserId>,
    ) -> Result<RegisteredEvidence, LedgerError> {
        intake.validate()?;
        let actor = actor
            .cloned()
            .ok_or_else(|| LedgerError::Auth("an authenticated actor is required".into()))?;

        let collected_at = Timestamp::now();
        let collection = CustodyEvent::collection(actor.clone(), collected_at);
        let record = intake.into_record(actor, collected_at);
        let case_id = record.case_id;
        let evidence_number = record.evidence_number.clone();

        let evidence_id = self.store.create(record).await?;
        tracing::info!(
            evidence_id = %evidence_id,
            case_id = %case_id,
            evidence_number = %evidence_number,
            collected_by = %collection.performed_by,
            "evidence registered"
        );
        Ok(RegisteredEvidence {
            evidence_id,
            case_id,
            evidence_number,
            collection,
        })
    }

    /// Register as the user reported by `actors`.
    pub async fn register_as_current(
        &self,
        actors: &dyn ActorProvider,
        intake: EvidenceIntake,
    ) -> Result<RegisteredEvidence, LedgerError> {
        let actor = actors.current_actor().await;
        self.register_evidence(intake, actor.as_ref()).await
    }

    /// Append one event to the custody log of `evidence_id`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Validation`] if `action` is a blank custom label.
    /// - [`LedgerError::Auth`] if `actor` is `None`.
    /// - [`LedgerError::NotFound`] if the evidence record does not exist.
    /// - [`LedgerError::Store`] if the store fails.
    /// - [`LedgerError::Conflict`] if every compare-and-swap attempt lost.
    ///
    /// Nothing is persisted when an error is returned before the write.
    pub async fn append_entry(
        &self,
        evidence_id: &EvidenceId,
        action: CustodyAction,
        actor: Option<&UserId>,
        details: EntryDetails,
    ) -> Result<CustodyEvent, LedgerError> {
        action.validate()?;
        let actor = actor
            .cloned()
            .ok_or_else(|| LedgerError::Auth("an authenticated actor is required".into()))?;
        let details = details.normalized();

        let max_attempts = match self.mode {
            ConcurrencyMode::LastWriteWins => 1,
            ConcurrencyMode::CompareAndSwap { max_attempts } => max_attempts.max(1),
        };

        for attempt in 1..=max_attempts {
            let record = self.load(evidence_id).await?;
            let expected_version = match self.mode {
                ConcurrencyMode::LastWriteWins => None,
                ConcurrencyMode::CompareAndSwap { .. } => {
                    if record.version.is_none() {
                        tracing::warn!(
                            evidence_id = %evidence_id,
                            "record store reports no version; append is last-write-wins"
                        );
                    }
                    record.version.clone()
                }
            };

            let event = CustodyEvent::new(
                action.clone(),
                actor.clone(),
                Timestamp::now(),
                details.clone(),
            );
            let mut custody_log = record.custody_log;
            custody_log.push(StoredEntry::from(&event));
            let length = custody_log.len();

            let write = CustodyWrite {
                custody_log,
                updated_at: Timestamp::now(),
                expected_version,
            };

            match self.store.set(evidence_id, write).await? {
                WriteOutcome::Written => {
                    tracing::info!(
                        evidence_id = %evidence_id,
                        action = %event.action,
                        performed_by = %event.performed_by,
                        log_length = length,
                        "custody entry appended"
                    );
                    return Ok(event);
                }
                WriteOutcome::Missing => return Err(LedgerError::NotFound(*evidence_id)),
                WriteOutcome::VersionConflict => {
                    tracing::warn!(
                        evidence_id = %evidence_id,
                        attempt,
                        max_attempts,
                        "custody log changed since read; re-reading"
                    );
                }
            }
        }

        Err(LedgerError::Conflict {
            evidence_id: *evidence_id,
            attempts: max_attempts,
        })
    }

    /// Append as the user reported by `actors`.
    pub async fn append_as_current(
        &self,
        actors: &dyn ActorProvider,
        evidence_id: &EvidenceId,
        action: CustodyAction,
        details: EntryDetails,
    ) -> Result<CustodyEvent, LedgerError> {
        let actor = actors.current_actor().await;
        self.append_entry(evidence_id, action, actor.as_ref(), details)
            .await
    }

    /// Read the custody timeline of `evidence_id`, oldest first.
    ///
    /// Performer ids are resolved in one batched lookup. Ids without a
    /// profile, and a failing resolver, both degrade to the placeholder
    /// identity; neither fails the read.
    pub async fn read_timeline(&self, evidence_id: &EvidenceId) -> Result<Timeline, LedgerError> {
        let record = self.load(evidence_id).await?;

        let synthetic_seed = record.custody_log.is_empty();
        let events = if synthetic_seed {
            tracing::debug!(evidence_id = %evidence_id, "empty custody log; deriving collection seed");
            vec![CustodyEvent::collection(
                record.collected_by,
                record.collected_at,
            )]
        } else {
            decode_log(evidence_id, &record.custody_log)?
        };

        let performers: BTreeSet<UserId> =
            events.iter().map(|e| e.performed_by.clone()).collect();
        let profiles = match self.identities.resolve_many(&performers).await {
            Ok(profiles) => profiles,
            Err(e) => {
                tracing::warn!(
                    evidence_id = %evidence_id,
                    error = %e,
                    "identity lookup failed; showing placeholder identities"
                );
                Default::default()
            }
        };

        let entries = events
            .into_iter()
            .map(|event| {
                let id = event.performed_by.clone();
                let actor = match profiles.get(&id) {
                    Some(profile) => ResolvedActor::from_profile(id, profile.clone()),
                    None => ResolvedActor::unknown(id),
                };
                TimelineEntry { event, actor }
            })
            .collect();

        Ok(Timeline {
            evidence_id: *evidence_id,
            entries,
            synthetic_seed,
        })
    }

    async fn load(&self, evidence_id: &EvidenceId) -> Result<CustodyRecord, LedgerError> {
        self.store
            .get(evidence_id)
            .await?
            .ok_or(LedgerError::NotFound(*evidence_id))
    }
}

fn decode_log(
    evidence_id: &EvidenceId,
    entries: &[StoredEntry],
) -> Result<Vec<CustodyEvent>, StoreError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.decode().map_err(|e| {
                StoreError::Malformed(format!(
                    "custody entry {index} of evidence {evidence_id}: {e}"
                ))
            })
        })
        .collect()
}
