//! # Chain-of-Custody API
//!
//! ## Endpoints
//!
//! - `POST /v1/evidence`: Register an evidence item collected by the caller
//! - `GET  /v1/evidence/{evidence_id}/custody`: Resolved custody timeline
//! - `POST /v1/evidence/{evidence_id}/custody`: Record a custody entry as the caller
//! - `GET  /v1/custody/actions`: Actions offered when recording
//! - `GET  /v1/custody/classify?action=`: Presentation class of a label
//!
//! Timelines are oldest first unless `?order=newest` is given.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use fcm_core::{CaseId, EvidenceId};
use fcm_custody::intake::DeviceProfile;
use fcm_custody::{
    classify_action, ActionClass, CustodyAction, CustodyEvent, EntryDetails, EvidenceIntake,
    RegisteredEvidence, ResolvedActor, StaticActor, Timeline, TimelineEntry,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_json, extract_path, extract_query};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Display order of a timeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TimelineOrder {
    /// Stored order.
    #[default]
    Oldest,
    /// Most recent first.
    Newest,
}

/// Query parameters of the timeline endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TimelineQuery {
    /// `oldest` (default) or `newest`.
    #[serde(default)]
    pub order: TimelineOrder,
}

/// Query parameters of the classify endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ClassifyQuery {
    /// Action label to classify.
    pub action: String,
}

/// Request to record a custody entry.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AppendEntryRequest {
    /// A catalogue label, `Custom Action` together with `custom_action`, or
    /// any free-form label.
    pub action: String,
    /// Label used when `action` is `Custom Action`.
    #[serde(default)]
    pub custom_action: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Hash value, typically a SHA-256 hex digest.
    #[serde(default)]
    pub hash_verification: Option<String>,
}

/// Identity of an acquired device.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DeviceRequest {
    pub model: String,
    pub serial: String,
    pub android_version: String,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub build_id: Option<String>,
}

/// Request to register an evidence item.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterEvidenceRequest {
    pub case_id: Uuid,
    /// Kind of item. Defaults to `Mobile Device` when `device` is given.
    #[serde(default, rename = "type")]
    pub evidence_type: Option<String>,
    /// Defaults to a summary of `device` when that is given.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceRequest>,
}

/// A newly registered evidence item.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisteredEvidenceResponse {
    pub evidence_id: Uuid,
    pub case_id: Uuid,
    pub evidence_number: String,
    /// First entry of the custody log.
    pub collection: CustodyEventResponse,
}

/// A custody event as stored.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CustodyEventResponse {
    pub action: String,
    pub performed_by: String,
    /// ISO-8601 UTC.
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_verification: Option<String>,
}

/// Display identity of a performer.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActorResponse {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    pub initials: String,
    /// `false` for the `Unknown User` placeholder.
    pub resolved: bool,
}

/// Presentation class of an action label.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClassificationResponse {
    pub category: String,
    pub icon: String,
    pub color: String,
}

/// One resolved timeline entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimelineEntryResponse {
    pub event: CustodyEventResponse,
    pub actor: ActorResponse,
    pub classification: ClassificationResponse,
    /// `MMM d, yyyy HH:mm` in UTC.
    pub display_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_preview: Option<String>,
}

/// Resolved custody timeline of an evidence item.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimelineResponse {
    pub evidence_id: Uuid,
    /// `true` when the stored log is empty and the only entry is derived
    /// from the collection record.
    pub synthetic_seed: bool,
    pub entries: Vec<TimelineEntryResponse>,
}

/// Actions offered when recording an entry.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActionCatalogResponse {
    pub actions: Vec<String>,
}

impl From<DeviceRequest> for DeviceProfile {
    fn from(device: DeviceRequest) -> Self {
        Self {
            model: device.model,
            serial: device.serial,
            android_version: device.android_version,
            manufacturer: device.manufacturer,
            build_id: device.build_id,
        }
    }
}

impl From<RegisterEvidenceRequest> for EvidenceIntake {
    fn from(req: RegisterEvidenceRequest) -> Self {
        let case_id = CaseId::from_uuid(req.case_id);
        let mut intake = match req.device {
            Some(device) => EvidenceIntake::device_acquisition(case_id, device.into()),
            None => EvidenceIntake {
                case_id,
                evidence_type: String::new(),
                description: String::new(),
                device: None,
            },
        };
        if let Some(evidence_type) = req.evidence_type {
            intake.evidence_type = evidence_type;
        }
        if let Some(description) = req.description {
            intake.description = description;
        }
        intake
    }
}

impl From<&RegisteredEvidence> for RegisteredEvidenceResponse {
    fn from(registered: &RegisteredEvidence) -> Self {
        Self {
            evidence_id: *registered.evidence_id.as_uuid(),
            case_id: *registered.case_id.as_uuid(),
            evidence_number: registered.evidence_number.clone(),
            collection: CustodyEventResponse::from(&registered.collection),
        }
    }
}

impl From<&CustodyEvent> for CustodyEventResponse {
    fn from(event: &CustodyEvent) -> Self {
        Self {
            action: event.action.label().to_string(),
            performed_by: event.performed_by.as_str().to_string(),
            timestamp: event.timestamp.to_iso8601(),
            location: event.location.clone(),
            notes: event.notes.clone(),
            hash_verification: event.hash_verification.clone(),
        }
    }
}

impl From<&ResolvedActor> for ActorResponse {
    fn from(actor: &ResolvedActor) -> Self {
        Self {
            display_name: actor.display_name.clone(),
            contact: actor.contact.clone(),
            initials: actor.initials(),
            resolved: actor.resolved,
        }
    }
}

impl From<ActionClass> for ClassificationResponse {
    fn from(class: ActionClass) -> Self {
        Self {
            category: class.category.as_str().to_string(),
            icon: class.icon.as_str().to_string(),
            color: class.color.as_str().to_string(),
        }
    }
}

impl From<&TimelineEntry> for TimelineEntryResponse {
    fn from(entry: &TimelineEntry) -> Self {
        Self {
            event: CustodyEventResponse::from(&entry.event),
            actor: ActorResponse::from(&entry.actor),
            classification: entry.classification().into(),
            display_time: entry.display_time(),
            hash_preview: entry.hash_preview(),
        }
    }
}

fn timeline_response(timeline: &Timeline, order: TimelineOrder) -> TimelineResponse {
    let entries = match order {
        TimelineOrder::Oldest => timeline.entries.iter().map(TimelineEntryResponse::from).collect(),
        TimelineOrder::Newest => timeline
            .newest_first()
            .into_iter()
            .map(TimelineEntryResponse::from)
            .collect(),
    };
    TimelineResponse {
        evidence_id: *timeline.evidence_id.as_uuid(),
        synthetic_seed: timeline.synthetic_seed,
        entries,
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/evidence", post(register_evidence))
        .route(
            "/v1/evidence/{evidence_id}/custody",
            get(read_timeline).post(append_entry),
        )
        .route("/v1/custody/actions", get(list_actions))
        .route("/v1/custody/classify", get(classify))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/evidence: Register an evidence item.
///
/// The item is collected by the authenticated caller now; its custody log
/// starts with the collection entry.
#[utoipa::path(
    post,
    path = "/v1/evidence",
    request_body = RegisterEvidenceRequest,
    responses(
        (status = 201, description = "Evidence registered", body = RegisteredEvidenceResponse),
        (status = 401, description = "No authenticated caller", body = crate::error::ErrorBody),
        (status = 422, description = "Missing type or description", body = crate::error::ErrorBody),
        (status = 502, description = "Evidence store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "custody"
)]
pub async fn register_evidence(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<RegisterEvidenceRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredEvidenceResponse>), AppError> {
    let req = extract_json(body)?;
    let actor = StaticActor::new(caller.user_id().cloned());

    let registered = state
        .ledger
        .register_as_current(&actor, EvidenceIntake::from(req))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegisteredEvidenceResponse::from(&registered)),
    ))
}

/// GET /v1/evidence/{evidence_id}/custody: Resolved custody timeline.
#[utoipa::path(
    get,
    path = "/v1/evidence/{evidence_id}/custody",
    params(("evidence_id" = Uuid, Path, description = "Evidence UUID"), TimelineQuery),
    responses(
        (status = 200, description = "Custody timeline", body = TimelineResponse),
        (status = 404, description = "Evidence not found", body = crate::error::ErrorBody),
        (status = 502, description = "Evidence store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "custody"
)]
pub async fn read_timeline(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<TimelineQuery>, QueryRejection>,
) -> Result<Json<TimelineResponse>, AppError> {
    let evidence_id = EvidenceId::from_uuid(extract_path(path)?);
    let query = extract_query(query)?;

    let timeline = state.ledger.read_timeline(&evidence_id).await?;
    Ok(Json(timeline_response(&timeline, query.order)))
}

/// POST /v1/evidence/{evidence_id}/custody: Record a custody entry.
///
/// The entry is attributed to the authenticated caller and stamped with
/// the server's current time.
#[utoipa::path(
    post,
    path = "/v1/evidence/{evidence_id}/custody",
    params(("evidence_id" = Uuid, Path, description = "Evidence UUID")),
    request_body = AppendEntryRequest,
    responses(
        (status = 201, description = "Entry recorded", body = CustodyEventResponse),
        (status = 401, description = "No authenticated caller", body = crate::error::ErrorBody),
        (status = 404, description = "Evidence not found", body = crate::error::ErrorBody),
        (status = 409, description = "Concurrent modification", body = crate::error::ErrorBody),
        (status = 422, description = "Missing action label", body = crate::error::ErrorBody),
        (status = 502, description = "Evidence store unavailable", body = crate::error::ErrorBody),
    ),
    tag = "custody"
)]
pub async fn append_entry(
    State(state): State<AppState>,
    caller: Caller,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<AppendEntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CustodyEventResponse>), AppError> {
    let evidence_id = EvidenceId::from_uuid(extract_path(path)?);
    let req = extract_json(body)?;

    let action = CustodyAction::from_selection(&req.action, req.custom_action.as_deref());
    let details = EntryDetails {
        location: req.location,
        notes: req.notes,
        hash_verification: req.hash_verification,
    };
    let actor = StaticActor::new(caller.user_id().cloned());

    let event = state
        .ledger
        .append_as_current(&actor, &evidence_id, action, details)
        .await?;
    Ok((StatusCode::CREATED, Json(CustodyEventResponse::from(&event))))
}

/// GET /v1/custody/actions: Actions offered when recording an entry.
#[utoipa::path(
    get,
    path = "/v1/custody/actions",
    responses(
        (status = 200, description = "Selectable actions", body = ActionCatalogResponse),
    ),
    tag = "custody"
)]
pub async fn list_actions() -> Json<ActionCatalogResponse> {
    Json(ActionCatalogResponse {
        actions: CustodyAction::selectable_labels()
            .into_iter()
            .map(str::to_string)
            .collect(),
    })
}

/// GET /v1/custody/classify: Presentation class of an action label.
#[utoipa::path(
    get,
    path = "/v1/custody/classify",
    params(ClassifyQuery),
    responses(
        (status = 200, description = "Classification", body = ClassificationResponse),
        (status = 400, description = "Missing action parameter", body = crate::error::ErrorBody),
    ),
    tag = "custody"
)]
pub async fn classify(
    query: Result<Query<ClassifyQuery>, QueryRejection>,
) -> Result<Json<ClassificationResponse>, AppError> {
    let query = extract_query(query)?;
    Ok(Json(classify_action(&query.action).into()))
}
