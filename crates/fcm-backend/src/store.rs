//! Custody-ledger collaborators backed by the hosted backend.
//!
//! The row's `updated_at` doubles as its version token: every successful
//! append rewrites it, and the conditional PATCH filters on the value
//! read.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use fcm_core::{EvidenceId, Timestamp, UserId};
use fcm_custody::{
    ActorProfile, ActorProvider, CustodyRecord, CustodyWrite, IdentityResolver, NewEvidence,
    RecordStore, RecordVersion, StoredEntry, StoreError, WriteOutcome,
};

use crate::evidence::{CustodyPatch, DeviceMetadata, EvidenceInsert, EvidenceRow};
use crate::BackendClient;

/// [`RecordStore`], [`IdentityResolver`] and [`ActorProvider`] over a
/// [`BackendClient`].
#[derive(Debug, Clone)]
pub struct BackendStore {
    client: BackendClient,
}

impl BackendStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BackendClient {
        &self.client
    }
}

/// Decode a stored row into the ledger's view of it.
///
/// Log entries stay as stored; the ledger decodes them when it reads a
/// timeline.
fn decode_row(row: EvidenceRow) -> Result<CustodyRecord, StoreError> {
    let custody_log = match row.chain_of_custody {
        None | Some(serde_json::Value::Null) => Vec::new(),
        Some(serde_json::Value::Array(entries)) => {
            entries.into_iter().map(StoredEntry::from_value).collect()
        }
        Some(other) => {
            return Err(StoreError::Malformed(format!(
                "chain_of_custody of evidence {} is not an array: {other}",
                row.id
            )))
        }
    };
    let collected_by = UserId::new(&row.collected_by)
        .map_err(|e| StoreError::Malformed(format!("collected_by of evidence {}: {e}", row.id)))?;
    let collected_at = Timestamp::parse(&row.collected_at)
        .map_err(|e| StoreError::Malformed(format!("collected_at of evidence {}: {e}", row.id)))?;

    Ok(CustodyRecord {
        custody_log,
        collected_by,
        collected_at,
        version: row.updated_at.map(RecordVersion::new),
    })
}

#[async_trait]
impl RecordStore for BackendStore {
    async fn create(&self, record: NewEvidence) -> Result<EvidenceId, StoreError> {
        let insert = EvidenceInsert {
            case_id: record.case_id,
            evidence_number: &record.evidence_number,
            evidence_type: &record.evidence_type,
            description: &record.description,
            collected_by: record.collected_by.as_str(),
            collected_at: record.collected_at.to_iso8601(),
            metadata: record.device.as_ref().map(DeviceMetadata::from),
            chain_of_custody: &record.custody_log,
        };
        let row = self.client.evidence().create(&insert).await?;
        Ok(EvidenceId::from_uuid(row.id))
    }

    async fn get(&self, evidence_id: &EvidenceId) -> Result<Option<CustodyRecord>, StoreError> {
        self.client
            .evidence()
            .get_custody(evidence_id)
            .await?
            .map(decode_row)
            .transpose()
    }

    async fn set(
        &self,
        evidence_id: &EvidenceId,
        write: CustodyWrite,
    ) -> Result<WriteOutcome, StoreError> {
        let patch = CustodyPatch {
            chain_of_custody: &write.custody_log,
            updated_at: write.updated_at.to_iso8601(),
        };
        let expected = write.expected_version.as_ref().map(RecordVersion::as_str);

        let updated = self
            .client
            .evidence()
            .update_custody(evidence_id, &patch, expected)
            .await?;
        if !updated.is_empty() {
            return Ok(WriteOutcome::Written);
        }

        // Nothing matched: either the row is gone or its version moved on.
        if expected.is_none() {
            return Ok(WriteOutcome::Missing);
        }
        match self.client.evidence().get_custody(evidence_id).await? {
            Some(_) => Ok(WriteOutcome::VersionConflict),
            None => Ok(WriteOutcome::Missing),
        }
    }
}

#[async_trait]
impl IdentityResolver for BackendStore {
    async fn resolve_many(
        &self,
        ids: &BTreeSet<UserId>,
    ) -> Result<HashMap<UserId, ActorProfile>, StoreError> {
        let rows = self
            .client
            .profiles()
            .get_many(ids.iter().map(UserId::as_str))
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let email = row.email.filter(|e| !e.trim().is_empty());
                let display_name = row
                    .full_name
                    .filter(|n| !n.trim().is_empty())
                    .or_else(|| email.clone())?;
                let id = UserId::new(row.id).ok()?;
                ids.contains(&id).then_some((
                    id,
                    ActorProfile {
                        display_name,
                        contact: email,
                    },
                ))
            })
            .collect())
    }
}

#[async_trait]
impl ActorProvider for BackendStore {
    async fn current_actor(&self) -> Option<UserId> {
        match self.client.session().current_user().await {
            Ok(user) => user.and_then(|u| UserId::new(u.id).ok()),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed; treating caller as signed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcm_custody::CustodyAction;

    fn row(log: Option<serde_json::Value>) -> EvidenceRow {
        EvidenceRow {
            id: uuid::Uuid::nil(),
            chain_of_custody: log,
            collected_by: "u-1".into(),
            collected_at: "2026-01-10T09:30:00+00:00".into(),
            updated_at: Some("2026-01-12T10:00:00.123+00:00".into()),
        }
    }

    #[test]
    fn null_log_decodes_as_empty() {
        let record = decode_row(row(None)).unwrap();
        assert!(record.custody_log.is_empty());
        let record = decode_row(row(Some(serde_json::Value::Null))).unwrap();
        assert!(record.custody_log.is_empty());
        assert_eq!(
            record.version,
            Some(RecordVersion::new("2026-01-12T10:00:00.123+00:00"))
        );
    }

    #[test]
    fn stored_entries_decode_in_order() {
        let record = decode_row(row(Some(serde_json::json!([
            {"action": "Evidence Collected", "performed_by": "u-1", "timestamp": "2026-01-10T09:30:00Z", "notes": "Initial evidence collection"},
            {"action": "Bagged and tagged", "performed_by": "u-2", "timestamp": "2026-01-11T09:30:00Z"}
        ]))))
        .unwrap();
        assert_eq!(record.custody_log.len(), 2);
        assert_eq!(
            record.custody_log[0].decode().unwrap().action,
            CustodyAction::Collected
        );
        assert_eq!(
            record.custody_log[1].decode().unwrap().action,
            CustodyAction::Custom("Bagged and tagged".into())
        );
    }

    #[test]
    fn stored_entries_are_kept_as_read() {
        let raw = serde_json::json!({
            "action": "Evidence Collected",
            "performed_by": "u-1",
            "timestamp": "2026-01-10T09:30:00.000Z",
            "location": null,
            "evidence_hash": "abc"
        });
        let record = decode_row(row(Some(serde_json::json!([raw.clone()])))).unwrap();
        assert_eq!(record.custody_log[0].as_value(), &raw);
    }

    #[test]
    fn non_array_log_is_malformed() {
        let err = decode_row(row(Some(serde_json::json!({"oops": true})))).unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }

    #[test]
    fn bad_collection_time_is_malformed() {
        let mut bad = row(None);
        bad.collected_at = "yesterday".into();
        assert!(matches!(decode_row(bad), Err(StoreError::Malformed(_))));
    }
}
