//! Client for the signed-in user (`GET /auth/v1/user`).

use serde::Deserialize;

use crate::error::{check_status, BackendError};

/// Path of the current-user endpoint in the auth API.
pub(crate) const USER_PATH: &str = "auth/v1/user";

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Client for the current session.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: reqwest::Client,
    url: url::Url,
    has_session: bool,
}

impl SessionClient {
    pub(crate) fn new(http: reqwest::Client, url: url::Url, has_session: bool) -> Self {
        Self {
            http,
            url,
            has_session,
        }
    }

    /// The signed-in user, or `None` without a session token or when the
    /// backend rejects it (401/403).
    pub async fn current_user(&self) -> Result<Option<SessionUser>, BackendError> {
        if !self.has_session {
            return Ok(None);
        }
        let endpoint = format!("GET /{USER_PATH}");

        let resp = crate::retry::ReadRetry::STANDARD
            .run(|| self.http.get(self.url.clone()).send())
            .await
            .map_err(|e| BackendError::Http {
                endpoint: endpoint.clone(),
                source: e,
            })?;

        if matches!(
            resp.status(),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN
        ) {
            return Ok(None);
        }

        let resp = check_status(&endpoint, resp).await?;
        resp.json()
            .await
            .map(Some)
            .map_err(|e| BackendError::Deserialization { endpoint, source: e })
    }
}
