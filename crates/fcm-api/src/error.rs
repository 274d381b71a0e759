//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps ledger errors to HTTP status codes with a JSON body carrying a
//! machine-readable code and a message. Store and internal failures are
//! logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fcm_custody::LedgerError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No authenticated caller (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Concurrent modification could not be resolved (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The record store failed (502). Message is logged, not returned.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500). Message is logged, not returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub(crate) fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Upstream(_) => {
                tracing::error!(error = %self, "record store failure");
                "The evidence store is unavailable".to_string()
            }
            Self::Internal(_) => {
                tracing::error!(error = %self, "internal server error");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Validation(msg) => Self::Validation(msg),
            LedgerError::Auth(msg) => Self::Unauthorized(msg),
            LedgerError::NotFound(id) => Self::NotFound(format!("evidence {id}")),
            LedgerError::Store(e) => Self::Upstream(e.to_string()),
            err @ LedgerError::Conflict { .. } => Self::Conflict(err.to_string()),
        }
    }
}

impl From<fcm_core::ValidationError> for AppError {
    fn from(err: fcm_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcm_core::EvidenceId;
    use fcm_custody::StoreError;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, ErrorBody) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[test]
    fn ledger_errors_map_to_statuses() {
        let cases = [
            (LedgerError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (LedgerError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (LedgerError::NotFound(EvidenceId::new()), StatusCode::NOT_FOUND),
            (
                LedgerError::Store(StoreError::Transport("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (
                LedgerError::Conflict {
                    evidence_id: EvidenceId::new(),
                    attempts: 5,
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (ledger_err, expected) in cases {
            let (status, _) = AppError::from(ledger_err).status_and_code();
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn upstream_hides_details() {
        let err = AppError::from(LedgerError::Store(StoreError::Rejected {
            status: 500,
            body: "relation \"evidence\" does not exist".into(),
        }));
        let (status, body) = response_parts(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error.code, "UPSTREAM_ERROR");
        assert!(!body.error.message.contains("relation"));
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) = response_parts(AppError::Internal("lock poisoned".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.message, "An internal error occurred");
    }

    #[tokio::test]
    async fn validation_message_is_returned() {
        let (status, body) =
            response_parts(AppError::Validation("custom action requires a label".into())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body.error.code, "VALIDATION_ERROR");
        assert!(body.error.message.contains("custom action requires a label"));
    }
}
