//! # Integration Tests for fcm-api
//!
//! Drives the assembled router with `oneshot` over an in-memory store:
//! health checks, evidence registration, authentication, timeline reads, entry recording, action
//! catalogue, classification, and the OpenAPI document.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use fcm_api::state::{AppConfig, AppState};
use fcm_core::{EvidenceId, Timestamp, UserId};
use fcm_custody::{ActorProfile, ConcurrencyMode, MemoryDirectory, MemoryRecordStore};

const SECRET: &str = "test-secret";

struct Harness {
    store: MemoryRecordStore,
    state: AppState,
    evidence_id: EvidenceId,
}

/// Build state with auth enabled and one registered evidence record.
fn harness() -> Harness {
    let store = MemoryRecordStore::versioned();
    let directory = MemoryDirectory::new();
    directory.insert(
        UserId::new("u-collector").unwrap(),
        ActorProfile {
            display_name: "Dana Reyes".into(),
            contact: Some("dana@lab.example".into()),
        },
    );
    let evidence_id = EvidenceId::new();
    store.insert(
        evidence_id,
        UserId::new("u-collector").unwrap(),
        Timestamp::parse("2026-01-05T14:03:00Z").unwrap(),
        vec![],
    );
    let config = AppConfig {
        port: 8080,
        auth_secret: Some(zeroize::Zeroizing::new(SECRET.to_string())),
        append_mode: ConcurrencyMode::default(),
    };
    let state = AppState::in_memory(config, store.clone(), directory);
    Harness {
        store,
        state,
        evidence_id,
    }
}

fn bearer(user: &str) -> String {
    format!("Bearer {user}:{SECRET}")
}

fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user) = user {
        builder = builder.header("authorization", bearer(user));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(user) = user {
        builder = builder.header("authorization", bearer(user));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn custody_uri(id: &EvidenceId) -> String {
    format!("/v1/evidence/{id}/custody")
}

// -- Health Checks ------------------------------------------------------------

#[tokio::test]
async fn liveness_and_readiness_need_no_auth() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app.clone().oneshot(get("/health/liveness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");

    let response = app.oneshot(get("/health/readiness", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Timeline -----------------------------------------------------------------

#[tokio::test]
async fn empty_log_reads_as_synthetic_collection_entry() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(get(&custody_uri(&h.evidence_id), Some("u-reader")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["synthetic_seed"], true);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["event"]["action"], "Evidence Collected");
    assert_eq!(entries[0]["event"]["notes"], "Initial evidence collection");
    assert_eq!(entries[0]["actor"]["display_name"], "Dana Reyes");
    assert_eq!(entries[0]["actor"]["initials"], "DR");
    assert_eq!(entries[0]["classification"]["category"], "collect");
    assert_eq!(entries[0]["classification"]["icon"], "upload");
    assert_eq!(entries[0]["display_time"], "Jan 5, 2026 14:03");

    assert!(h.store.stored_log(&h.evidence_id).unwrap().is_empty());
}

#[tokio::test]
async fn unknown_evidence_is_404() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(get(&custody_uri(&EvidenceId::new()), Some("u-reader")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn malformed_evidence_id_is_400() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(get("/v1/evidence/not-a-uuid/custody", Some("u-reader")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn timeline_requires_credentials_when_auth_enabled() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(get(&custody_uri(&h.evidence_id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// -- Append ---------------------------------------------------------------------

#[tokio::test]
async fn append_records_entry_as_caller() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .clone()
        .oneshot(post_json(
            &custody_uri(&h.evidence_id),
            Some("u-analyst"),
            serde_json::json!({
                "action": "Hash Verified",
                "location": "",
                "hash_verification": "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await;
    assert_eq!(event["action"], "Hash Verified");
    assert_eq!(event["performed_by"], "u-analyst");
    assert!(event.get("location").is_none());
    assert!(event.get("notes").is_none());

    let log = h.store.stored_log(&h.evidence_id).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].performed_by.as_str(), "u-analyst");

    let response = app
        .oneshot(get(
            &format!("{}?order=newest", custody_uri(&h.evidence_id)),
            Some("u-reader"),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["synthetic_seed"], false);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["actor"]["display_name"], "Unknown User");
    assert_eq!(entries[0]["actor"]["initials"], "??");
    assert_eq!(entries[0]["hash_preview"], "e3b0c44298fc1c14...");
    assert_eq!(entries[0]["classification"]["category"], "verify");
}

#[tokio::test]
async fn newest_order_reverses_entries() {
    let h = harness();
    let app = fcm_api::app(h.state);

    for action in ["Evidence Transferred", "Evidence Sealed"] {
        let response = app
            .clone()
            .oneshot(post_json(
                &custody_uri(&h.evidence_id),
                Some("u-analyst"),
                serde_json::json!({ "action": action }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let oldest = body_json(
        app.clone()
            .oneshot(get(&custody_uri(&h.evidence_id), Some("u-reader")))
            .await
            .unwrap(),
    )
    .await;
    let newest = body_json(
        app.oneshot(get(
            &format!("{}?order=newest", custody_uri(&h.evidence_id)),
            Some("u-reader"),
        ))
        .await
        .unwrap(),
    )
    .await;

    assert_eq!(oldest["entries"][0]["event"]["action"], "Evidence Transferred");
    assert_eq!(newest["entries"][0]["event"]["action"], "Evidence Sealed");
}

#[tokio::test]
async fn custom_action_uses_custom_label() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(post_json(
            &custody_uri(&h.evidence_id),
            Some("u-analyst"),
            serde_json::json!({
                "action": "Custom Action",
                "custom_action": "Imaged with write blocker",
                "notes": "Tableau T8u"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let log = h.store.stored_log(&h.evidence_id).unwrap();
    assert_eq!(log[0].action.label(), "Imaged with write blocker");
    assert_eq!(log[0].notes.as_deref(), Some("Tableau T8u"));
}

#[tokio::test]
async fn blank_custom_action_is_422_and_writes_nothing() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(post_json(
            &custody_uri(&h.evidence_id),
            Some("u-analyst"),
            serde_json::json!({ "action": "Custom Action", "custom_action": "  " }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    assert!(h.store.stored_log(&h.evidence_id).unwrap().is_empty());
}

#[tokio::test]
async fn append_without_auth_configured_is_401() {
    let h = harness();
    let config = AppConfig {
        auth_secret: None,
        ..AppConfig::default()
    };
    let state = AppState::in_memory(config, h.store.clone(), MemoryDirectory::new());
    let app = fcm_api::app(state);

    let response = app
        .oneshot(post_json(
            &custody_uri(&h.evidence_id),
            None,
            serde_json::json!({ "action": "Evidence Stored" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.store.stored_log(&h.evidence_id).unwrap().is_empty());
}

#[tokio::test]
async fn unknown_body_field_is_400() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(post_json(
            &custody_uri(&h.evidence_id),
            Some("u-analyst"),
            serde_json::json!({ "action": "Evidence Stored", "performed_by": "someone-else" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(h.store.stored_log(&h.evidence_id).unwrap().is_empty());
}

// -- Registration ---------------------------------------------------------------

const CASE_ID: &str = "0b7d4c1a-92e3-4f7a-8d5e-2c3b4a5d6e7f";

#[tokio::test]
async fn registered_device_reads_back_with_stored_collection_entry() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/evidence",
            Some("u-collector"),
            serde_json::json!({
                "case_id": CASE_ID,
                "device": {
                    "model": "Pixel 7",
                    "serial": "2A1B",
                    "android_version": "14"
                }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["case_id"], CASE_ID);
    assert!(body["evidence_number"].as_str().unwrap().starts_with("EVD-"));
    assert_eq!(body["collection"]["action"], "Evidence Collected");
    assert_eq!(body["collection"]["performed_by"], "u-collector");

    let evidence_id: EvidenceId = body["evidence_id"].as_str().unwrap().parse().unwrap();
    assert_eq!(h.store.len(), 2);
    assert_eq!(h.store.case_id(&evidence_id).unwrap().to_string(), CASE_ID);
    assert_eq!(h.store.stored_log(&evidence_id).unwrap().len(), 1);

    let response = app
        .oneshot(get(&custody_uri(&evidence_id), Some("u-reader")))
        .await
        .unwrap();
    let timeline = body_json(response).await;
    assert_eq!(timeline["synthetic_seed"], false);
    assert_eq!(timeline["entries"][0]["actor"]["display_name"], "Dana Reyes");
    assert_eq!(
        timeline["entries"][0]["event"]["notes"],
        "Initial evidence collection"
    );
}

#[tokio::test]
async fn register_without_credentials_is_401_and_creates_nothing() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(post_json(
            "/v1/evidence",
            None,
            serde_json::json!({
                "case_id": CASE_ID,
                "type": "Document",
                "description": "Signed statement"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(h.store.len(), 1);
}

#[tokio::test]
async fn register_with_blank_description_is_422() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(post_json(
            "/v1/evidence",
            Some("u-collector"),
            serde_json::json!({
                "case_id": CASE_ID,
                "type": "Document",
                "description": "   "
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_json(response).await["error"]["code"], "VALIDATION_ERROR");
    assert_eq!(h.store.len(), 1);
}

// -- Catalogue & Classification -------------------------------------------------

#[tokio::test]
async fn action_catalogue_ends_with_custom_entry() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let body = body_json(
        app.oneshot(get("/v1/custody/actions", Some("u-reader")))
            .await
            .unwrap(),
    )
    .await;
    let actions: Vec<&str> = body["actions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(actions.len(), 9);
    assert_eq!(actions.first(), Some(&"Evidence Transferred"));
    assert_eq!(actions.last(), Some(&"Custom Action"));
    assert!(!actions.contains(&"Evidence Collected"));
}

#[tokio::test]
async fn classify_returns_presentation_class() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let body = body_json(
        app.clone()
            .oneshot(get("/v1/custody/classify?action=Evidence%20Analyzed", Some("u-reader")))
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(body["category"], "examine");
    assert_eq!(body["icon"], "document");
    assert_eq!(body["color"], "purple");

    let response = app
        .oneshot(get("/v1/custody/classify", Some("u-reader")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- OpenAPI & Metrics --------------------------------------------------------

#[tokio::test]
async fn openapi_document_is_served() {
    let h = harness();
    let app = fcm_api::app(h.state);

    let response = app
        .oneshot(get("/openapi.json", Some("u-reader")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["paths"]["/v1/evidence/{evidence_id}/custody"].is_object());
}

#[tokio::test]
async fn metrics_count_requests_and_errors() {
    let h = harness();
    let metrics = h.state.metrics.clone();
    let app = fcm_api::app(h.state);

    app.clone()
        .oneshot(get("/v1/custody/actions", Some("u-reader")))
        .await
        .unwrap();
    app.oneshot(get(&custody_uri(&EvidenceId::new()), Some("u-reader")))
        .await
        .unwrap();

    assert_eq!(metrics.requests(), 2);
    assert_eq!(metrics.errors(), 1);
}
