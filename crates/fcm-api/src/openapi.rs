//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI document served
//! at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "FCM Chain-of-Custody API",
        version = "0.1.0",
        description = "Append-only chain-of-custody ledger for forensic evidence: evidence intake, timelines, entry recording and action classification.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        crate::routes::custody::register_evidence,
        crate::routes::custody::read_timeline,
        crate::routes::custody::append_entry,
        crate::routes::custody::list_actions,
        crate::routes::custody::classify,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::custody::TimelineOrder,
        crate::routes::custody::AppendEntryRequest,
        crate::routes::custody::DeviceRequest,
        crate::routes::custody::RegisterEvidenceRequest,
        crate::routes::custody::RegisteredEvidenceResponse,
        crate::routes::custody::CustodyEventResponse,
        crate::routes::custody::ActorResponse,
        crate::routes::custody::ClassificationResponse,
        crate::routes::custody::TimelineEntryResponse,
        crate::routes::custody::TimelineResponse,
        crate::routes::custody::ActionCatalogResponse,
    )),
    tags(
        (name = "custody", description = "Chain of custody"),
    )
)]
pub struct ApiDoc;

/// Serves the OpenAPI JSON spec at `/openapi.json`.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_custody_paths() {
        let spec = ApiDoc::openapi();
        assert!(spec.paths.paths.contains_key("/v1/evidence"));
        assert!(spec.paths.paths.contains_key("/v1/evidence/{evidence_id}/custody"));
        assert!(spec.paths.paths.contains_key("/v1/custody/actions"));
        assert!(spec.paths.paths.contains_key("/v1/custody/classify"));
    }
}
