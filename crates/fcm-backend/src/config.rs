//! Backend client configuration.
//!
//! One base URL serves both the REST row API (`/rest/v1`) and the auth
//! API (`/auth/v1`). Override via environment variables or construct
//! explicitly for tests.

use url::Url;
use zeroize::Zeroizing;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for connecting to the hosted backend.
///
/// Custom `Debug` implementation redacts the key and the session token.
#[derive(Clone)]
pub struct BackendConfig {
    /// Project base URL, e.g. `https://abc.backend.example`.
    pub base_url: Url,
    /// Project API key, sent as the `apikey` header.
    pub api_key: Zeroizing<String>,
    /// Session token of the signed-in user. Without it requests run with
    /// the project key alone and there is no current user.
    pub access_token: Option<Zeroizing<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `FCM_BACKEND_URL` (required)
    /// - `FCM_BACKEND_API_KEY` (required)
    /// - `FCM_ACCESS_TOKEN` (optional)
    /// - `FCM_BACKEND_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url =
            std::env::var("FCM_BACKEND_URL").map_err(|_| ConfigError::MissingVar("FCM_BACKEND_URL"))?;
        let api_key = std::env::var("FCM_BACKEND_API_KEY")
            .map_err(|_| ConfigError::MissingVar("FCM_BACKEND_API_KEY"))?;

        Ok(Self {
            base_url: parse_url("FCM_BACKEND_URL", &raw_url)?,
            api_key: Zeroizing::new(api_key),
            access_token: std::env::var("FCM_ACCESS_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(Zeroizing::new),
            timeout_secs: std::env::var("FCM_BACKEND_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// `true` when `FCM_BACKEND_URL` is set, i.e. a backend is intended.
    pub fn is_configured() -> bool {
        std::env::var_os("FCM_BACKEND_URL").is_some()
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(base_url: &str, api_key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_url("local mock", base_url)?,
            api_key: Zeroizing::new(api_key.to_string()),
            access_token: None,
            timeout_secs: 5,
        })
    }

    /// Attach a user session token.
    pub fn with_access_token(mut self, token: &str) -> Self {
        self.access_token = Some(Zeroizing::new(token.to_string()));
        self
    }

    /// Resolve a path against the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path)
            .map_err(|e| ConfigError::InvalidUrl(path.to_string(), e.to_string()))
    }
}

fn parse_url(source: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl(source.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("credential is not a valid header value")]
    InvalidCredential,
}
