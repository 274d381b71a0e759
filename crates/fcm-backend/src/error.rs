//! Backend client error types.

use fcm_custody::StoreError;

/// Errors from backend calls.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The backend returned a non-2xx status.
    #[error("backend {endpoint} returned {status}: {body}")]
    ApiError {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::ApiError { status, body, .. } => StoreError::Rejected { status, body },
            BackendError::Deserialization { .. } => StoreError::Malformed(err.to_string()),
            BackendError::Http { .. } | BackendError::Config(_) => {
                StoreError::Transport(err.to_string())
            }
        }
    }
}

/// Turn a non-2xx response into [`BackendError::ApiError`].
pub(crate) async fn check_status(
    endpoint: &str,
    resp: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    Err(BackendError::ApiError {
        endpoint: endpoint.to_string(),
        status,
        body,
    })
}
