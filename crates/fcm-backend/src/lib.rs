//! # fcm-backend: Hosted Backend Client
//!
//! Typed access to the hosted backend the case-management client stores
//! its data in:
//! - **Evidence rows** via the REST row API (`/rest/v1/evidence`)
//! - **Profiles** via the REST row API (`/rest/v1/profiles`)
//! - **Session** via the auth API (`/auth/v1/user`)
//!
//! [`BackendStore`] adapts the client to the custody ledger's collaborator
//! traits.
//!
//! ## Authentication
//!
//! Every request carries the project key as `apikey` and a bearer token:
//! the user's session token when one is configured, otherwise the project
//! key itself.

pub mod config;
pub mod error;
pub mod evidence;
pub mod profiles;
pub(crate) mod retry;
pub mod session;
pub mod store;

pub use config::{BackendConfig, ConfigError};
pub use error::BackendError;
pub use store::BackendStore;

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

/// Top-level backend client. Holds one sub-client per resource.
#[derive(Debug, Clone)]
pub struct BackendClient {
    evidence: evidence::EvidenceClient,
    profiles: profiles::ProfileClient,
    session: session::SessionClient,
}

impl BackendClient {
    /// Create a backend client from configuration.
    pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
        let bearer = config
            .access_token
            .as_ref()
            .map(|t| t.as_str())
            .unwrap_or(config.api_key.as_str());

        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(config.api_key.as_str()).map_err(|_| ConfigError::InvalidCredential)?;
        api_key.set_sensitive(true);
        headers.insert("apikey", api_key);
        let mut authorization = HeaderValue::from_str(&format!("Bearer {bearer}"))
            .map_err(|_| ConfigError::InvalidCredential)?;
        authorization.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| BackendError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            evidence: evidence::EvidenceClient::new(
                http.clone(),
                config.endpoint(evidence::EVIDENCE_PATH)?,
            ),
            profiles: profiles::ProfileClient::new(
                http.clone(),
                config.endpoint(profiles::PROFILES_PATH)?,
            ),
            session: session::SessionClient::new(
                http,
                config.endpoint(session::USER_PATH)?,
                config.access_token.is_some(),
            ),
        })
    }

    /// Access the evidence row client.
    pub fn evidence(&self) -> &evidence::EvidenceClient {
        &self.evidence
    }

    /// Access the profile client.
    pub fn profiles(&self) -> &profiles::ProfileClient {
        &self.profiles
    }

    /// Access the session client.
    pub fn session(&self) -> &session::SessionClient {
        &self.session
    }
}
