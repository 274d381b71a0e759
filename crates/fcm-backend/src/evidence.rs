//! Typed client for evidence rows.
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | POST   | `/rest/v1/evidence` | Create a row at intake |
//! | GET    | `/rest/v1/evidence?id=eq.{id}` | Read the custody slice of one row |
//! | PATCH  | `/rest/v1/evidence?id=eq.{id}[&updated_at=eq.{prev}]` | Replace the custody log |
//!
//! The PATCH asks for `return=representation`, so the response lists the
//! rows actually updated. When the `updated_at` filter no longer matches,
//! that list is empty. Neither write is retried.

use fcm_core::{CaseId, EvidenceId};
use fcm_custody::intake::DeviceProfile;
use fcm_custody::StoredEntry;
use serde::{Deserialize, Serialize};

use crate::error::{check_status, BackendError};

/// Path of the evidence table in the REST row API.
pub(crate) const EVIDENCE_PATH: &str = "rest/v1/evidence";

/// Columns read for custody operations.
const CUSTODY_COLUMNS: &str = "id,chain_of_custody,collected_by,collected_at,updated_at";

// -- Request/Response types ---------------------------------------------------

/// Custody columns of an evidence row as returned by the backend.
///
/// `chain_of_custody` is kept as raw JSON; decoding into events happens in
/// the store adapter so a malformed log surfaces as a store error rather
/// than a transport one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EvidenceRow {
    pub id: uuid::Uuid,
    #[serde(default)]
    pub chain_of_custody: Option<serde_json::Value>,
    pub collected_by: String,
    pub collected_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of a custody log replacement.
#[derive(Debug, Serialize)]
pub struct CustodyPatch<'a> {
    pub chain_of_custody: &'a [StoredEntry],
    pub updated_at: String,
}

/// Body of an evidence row insert.
#[derive(Debug, Serialize)]
pub struct EvidenceInsert<'a> {
    pub case_id: CaseId,
    pub evidence_number: &'a str,
    #[serde(rename = "type")]
    pub evidence_type: &'a str,
    pub description: &'a str,
    pub collected_by: &'a str,
    pub collected_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DeviceMetadata<'a>>,
    pub chain_of_custody: &'a [StoredEntry],
}

/// `metadata` column of a device acquisition row.
#[derive(Debug, Serialize)]
pub struct DeviceMetadata<'a> {
    pub device_model: &'a str,
    pub device_serial: &'a str,
    pub android_version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_id: Option<&'a str>,
}

impl<'a> From<&'a DeviceProfile> for DeviceMetadata<'a> {
    fn from(device: &'a DeviceProfile) -> Self {
        Self {
            device_model: &device.model,
            device_serial: &device.serial,
            android_version: &device.android_version,
            manufacturer: device.manufacturer.as_deref(),
            build_id: device.build_id.as_deref(),
        }
    }
}

// -- Client -------------------------------------------------------------------

/// Client for evidence rows.
#[derive(Debug, Clone)]
pub struct EvidenceClient {
    http: reqwest::Client,
    url: url::Url,
}

impl EvidenceClient {
    pub(crate) fn new(http: reqwest::Client, url: url::Url) -> Self {
        Self { http, url }
    }

    /// Insert one evidence row and return it as created.
    pub async fn create(&self, insert: &EvidenceInsert<'_>) -> Result<EvidenceRow, BackendError> {
        let endpoint = format!("POST /{EVIDENCE_PATH}");

        let resp = self
            .http
            .post(self.url.clone())
            .query(&[("select", CUSTODY_COLUMNS)])
            .header("Prefer", "return=representation")
            .json(insert)
            .send()
            .await
            .map_err(|e| BackendError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let resp = check_status(&endpoint, resp).await?;
        let rows: Vec<EvidenceRow> = resp.json().await.map_err(|e| BackendError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        rows.into_iter().next().ok_or_else(|| BackendError::ApiError {
            endpoint,
            status: 201,
            body: "insert returned no row".into(),
        })
    }

    /// Fetch the custody columns of one evidence row.
    ///
    /// Returns `Ok(None)` when no row has this id.
    pub async fn get_custody(
        &self,
        evidence_id: &EvidenceId,
    ) -> Result<Option<EvidenceRow>, BackendError> {
        let endpoint = format!("GET /{EVIDENCE_PATH}?id=eq.{evidence_id}");
        let id_filter = format!("eq.{evidence_id}");

        let resp = crate::retry::ReadRetry::STANDARD.run(|| {
            self.http
                .get(self.url.clone())
                .query(&[("select", CUSTODY_COLUMNS), ("id", id_filter.as_str())])
                .send()
        })
        .await
        .map_err(|e| BackendError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;

        let resp = check_status(&endpoint, resp).await?;
        let rows: Vec<EvidenceRow> = resp.json().await.map_err(|e| BackendError::Deserialization {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        Ok(rows.into_iter().next())
    }

    /// Replace the custody log of one evidence row.
    ///
    /// With `expected_updated_at`, the update applies only if the row's
    /// `updated_at` still equals it. Returns the updated rows; an empty list
    /// means nothing matched the filters. Sent once, never retried.
    pub async fn update_custody(
        &self,
        evidence_id: &EvidenceId,
        patch: &CustodyPatch<'_>,
        expected_updated_at: Option<&str>,
    ) -> Result<Vec<EvidenceRow>, BackendError> {
        let endpoint = format!("PATCH /{EVIDENCE_PATH}?id=eq.{evidence_id}");

        let mut filters = vec![
            ("select", CUSTODY_COLUMNS.to_string()),
            ("id", format!("eq.{evidence_id}")),
        ];
        if let Some(prev) = expected_updated_at {
            filters.push(("updated_at", format!("eq.{prev}")));
        }

        let resp = self
            .http
            .patch(self.url.clone())
            .query(&filters)
            .header("Prefer", "return=representation")
            .json(patch)
            .send()
            .await
            .map_err(|e| BackendError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        let resp = check_status(&endpoint, resp).await?;
        resp.json().await.map_err(|e| BackendError::Deserialization { endpoint, source: e })
    }
}
