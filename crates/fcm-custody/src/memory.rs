//! # In-Memory Collaborators
//!
//! Process-local implementations of the collaborator traits, used by the
//! API server when no backend is configured and by tests.
//!
//! All operations are synchronous under a `parking_lot` lock; the lock is
//! never held across an `.await`. `parking_lot::RwLock` does not poison, so
//! a panicking writer cannot wedge the store.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use fcm_core::{CaseId, EvidenceId, Timestamp, UserId};
use parking_lot::RwLock;

use crate::event::{CustodyEvent, StoredEntry};
use crate::store::{
    ActorProfile, ActorProvider, CustodyRecord, CustodyWrite, IdentityResolver, NewEvidence,
    RecordStore, RecordVersion, StoreError, WriteOutcome,
};

/// Stored form of one evidence record's custody slice.
#[derive(Debug, Clone)]
struct StoredEvidence {
    case_id: Option<CaseId>,
    custody_log: Vec<StoredEntry>,
    collected_by: UserId,
    collected_at: Timestamp,
    updated_at: Timestamp,
    version: u64,
}

/// Thread-safe, cloneable in-memory record store.
///
/// Two flavours:
/// - [`MemoryRecordStore::versioned`] reports a version with every read and
///   rejects writes whose `expected_version` is stale.
/// - [`MemoryRecordStore::unversioned`] reports no version and applies every
///   write, reproducing a plain read-modify-write backend.
#[derive(Debug, Clone)]
pub struct MemoryRecordStore {
    data: Arc<RwLock<HashMap<EvidenceId, StoredEvidence>>>,
    versioned: bool,
}

impl MemoryRecordStore {
    /// Store with compare-and-swap support.
    pub fn versioned() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            versioned: true,
        }
    }

    /// Store without versioning.
    pub fn unversioned() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            versioned: false,
        }
    }

    /// Register an evidence record, replacing any existing one.
    pub fn insert(
        &self,
        evidence_id: EvidenceId,
        collected_by: UserId,
        collected_at: Timestamp,
        custody_log: Vec<CustodyEvent>,
    ) {
        let entries = custody_log.iter().map(StoredEntry::from).collect();
        self.insert_entries(evidence_id, collected_by, collected_at, entries);
    }

    /// Register an evidence record whose log is given as stored entries.
    pub fn insert_entries(
        &self,
        evidence_id: EvidenceId,
        collected_by: UserId,
        collected_at: Timestamp,
        custody_log: Vec<StoredEntry>,
    ) {
        self.data.write().insert(
            evidence_id,
            StoredEvidence {
                case_id: None,
                custody_log,
                collected_by,
                collected_at,
                updated_at: collected_at,
                version: 0,
            },
        );
    }

    /// Stored log of a record decoded into events, bypassing any
    /// derivation. Entries that do not decode are left out.
    pub fn stored_log(&self, evidence_id: &EvidenceId) -> Option<Vec<CustodyEvent>> {
        self.data.read().get(evidence_id).map(|stored| {
            stored
                .custody_log
                .iter()
                .filter_map(|entry| entry.decode().ok())
                .collect()
        })
    }

    /// Stored log of a record, entries exactly as written.
    pub fn stored_entries(&self, evidence_id: &EvidenceId) -> Option<Vec<StoredEntry>> {
        self.data
            .read()
            .get(evidence_id)
            .map(|stored| stored.custody_log.clone())
    }

    /// Case a record was created under, for records created at intake.
    pub fn case_id(&self, evidence_id: &EvidenceId) -> Option<CaseId> {
        self.data.read().get(evidence_id).and_then(|stored| stored.case_id)
    }

    /// Last `updated_at` written for a record.
    pub fn updated_at(&self, evidence_id: &EvidenceId) -> Option<Timestamp> {
        self.data.read().get(evidence_id).map(|stored| stored.updated_at)
    }

    /// Remove a record. Its custody log goes with it.
    pub fn remove(&self, evidence_id: &EvidenceId) -> bool {
        self.data.write().remove(evidence_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::versioned()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, record: NewEvidence) -> Result<EvidenceId, StoreError> {
        let evidence_id = EvidenceId::new();
        self.data.write().insert(
            evidence_id,
            StoredEvidence {
                case_id: Some(record.case_id),
                custody_log: record.custody_log,
                collected_by: record.collected_by,
                collected_at: record.collected_at,
                updated_at: record.collected_at,
                version: 0,
            },
        );
        Ok(evidence_id)
    }

    async fn get(&self, evidence_id: &EvidenceId) -> Result<Option<CustodyRecord>, StoreError> {
        Ok(self.data.read().get(evidence_id).map(|stored| CustodyRecord {
            custody_log: stored.custody_log.clone(),
            collected_by: stored.collected_by.clone(),
            collected_at: stored.collected_at,
            version: self
                .versioned
                .then(|| RecordVersion::new(stored.version.to_string())),
        }))
    }

    async fn set(
        &self,
        evidence_id: &EvidenceId,
        write: CustodyWrite,
    ) -> Result<WriteOutcome, StoreError> {
        let mut guard = self.data.write();
        let Some(stored) = guard.get_mut(evidence_id) else {
            return Ok(WriteOutcome::Missing);
        };
        if self.versioned {
            if let Some(expected) = &write.expected_version {
                if expected.as_str() != stored.version.to_string() {
                    return Ok(WriteOutcome::VersionConflict);
                }
            }
        }
        stored.custody_log = write.custody_log;
        stored.updated_at = write.updated_at;
        stored.version += 1;
        Ok(WriteOutcome::Written)
    }
}

/// In-memory user directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    profiles: Arc<RwLock<HashMap<UserId, ActorProfile>>>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a profile.
    pub fn insert(&self, id: UserId, profile: ActorProfile) {
        self.profiles.write().insert(id, profile);
    }
}

#[async_trait]
impl IdentityResolver for MemoryDirectory {
    async fn resolve_many(
        &self,
        ids: &BTreeSet<UserId>,
    ) -> Result<HashMap<UserId, ActorProfile>, StoreError> {
        let profiles = self.profiles.read();
        Ok(ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}

/// Actor provider returning a fixed identity (or none).
#[derive(Debug, Clone, Default)]
pub struct StaticActor(Option<UserId>);

impl StaticActor {
    pub fn new(actor: Option<UserId>) -> Self {
        Self(actor)
    }

    pub fn anonymous() -> Self {
        Self(None)
    }
}

#[async_trait]
impl ActorProvider for StaticActor {
    async fn current_actor(&self) -> Option<UserId> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::CustodyAction;
    use crate::event::EntryDetails;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse(s).unwrap()
    }

    fn event() -> CustodyEvent {
        CustodyEvent::new(
            CustodyAction::Sealed,
            user("u1"),
            ts("2026-01-02T00:00:00Z"),
            EntryDetails::default(),
        )
    }

    #[tokio::test]
    async fn versioned_store_rejects_stale_write() {
        let store = MemoryRecordStore::versioned();
        let id = EvidenceId::new();
        store.insert(id, user("u1"), ts("2026-01-01T00:00:00Z"), vec![]);

        let first = store.get(&id).await.unwrap().unwrap();
        assert_eq!(first.version, Some(RecordVersion::new("0")));

        let write = CustodyWrite {
            custody_log: vec![StoredEntry::from(&event())],
            updated_at: ts("2026-01-02T00:00:00Z"),
            expected_version: first.version.clone(),
        };
        assert_eq!(store.set(&id, write.clone()).await.unwrap(), WriteOutcome::Written);
        assert_eq!(
            store.set(&id, write).await.unwrap(),
            WriteOutcome::VersionConflict
        );
        assert_eq!(store.stored_log(&id).unwrap().len(), 1);
        assert_eq!(store.updated_at(&id), Some(ts("2026-01-02T00:00:00Z")));
    }

    #[tokio::test]
    async fn unversioned_store_applies_every_write() {
        let store = MemoryRecordStore::unversioned();
        let id = EvidenceId::new();
        store.insert(id, user("u1"), ts("2026-01-01T00:00:00Z"), vec![]);

        let read = store.get(&id).await.unwrap().unwrap();
        assert_eq!(read.version, None);

        let write = CustodyWrite {
            custody_log: vec![StoredEntry::from(&event())],
            updated_at: ts("2026-01-02T00:00:00Z"),
            expected_version: Some(RecordVersion::new("stale")),
        };
        assert_eq!(store.set(&id, write).await.unwrap(), WriteOutcome::Written);
    }

    #[tokio::test]
    async fn write_to_unknown_record_reports_missing() {
        let store = MemoryRecordStore::versioned();
        let write = CustodyWrite {
            custody_log: vec![],
            updated_at: ts("2026-01-02T00:00:00Z"),
            expected_version: None,
        };
        assert_eq!(
            store.set(&EvidenceId::new(), write).await.unwrap(),
            WriteOutcome::Missing
        );
    }

    #[tokio::test]
    async fn removing_record_drops_its_log() {
        let store = MemoryRecordStore::versioned();
        let id = EvidenceId::new();
        store.insert(id, user("u1"), ts("2026-01-01T00:00:00Z"), vec![event()]);
        assert_eq!(store.len(), 1);
        assert!(store.remove(&id));
        assert!(store.is_empty());
        assert!(store.get(&id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn directory_returns_only_known_profiles() {
        let directory = MemoryDirectory::new();
        directory.insert(
            user("u1"),
            ActorProfile {
                display_name: "Dana Reyes".into(),
                contact: Some("dana@lab.example".into()),
            },
        );
        let ids: BTreeSet<UserId> = [user("u1"), user("ghost")].into_iter().collect();
        let resolved = directory.resolve_many(&ids).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[&user("u1")].display_name, "Dana Reyes");
    }

    #[tokio::test]
    async fn static_actor_reports_configured_identity() {
        assert_eq!(StaticActor::anonymous().current_actor().await, None);
        assert_eq!(
            StaticActor::new(Some(user("u9"))).current_actor().await,
            Some(user("u9"))
        );
    }

    #[tokio::test]
    async fn created_record_reads_back_with_its_log() {
        let store = MemoryRecordStore::versioned();
        let case_id = CaseId::new();
        let record = NewEvidence {
            case_id,
            evidence_number: "EVD-1".into(),
            evidence_type: "Mobile Device".into(),
            description: "handset".into(),
            collected_by: user("u1"),
            collected_at: ts("2026-01-01T00:00:00Z"),
            device: None,
            custody_log: vec![StoredEntry::from(&event())],
        };
        let id = store.create(record).await.unwrap();

        assert_eq!(store.case_id(&id), Some(case_id));
        let read = store.get(&id).await.unwrap().unwrap();
        assert_eq!(read.custody_log.len(), 1);
        assert_eq!(read.collected_by, user("u1"));
        assert_eq!(read.version, Some(RecordVersion::new("0")));
    }
}
