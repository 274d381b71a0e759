//! # Authentication Middleware
//!
//! Bearer token middleware binding each request to a user.
//!
//! ## Token Format
//!
//! ```text
//! Bearer {user_id}:{secret}
//! ```
//!
//! The secret is compared in constant time against the configured shared
//! secret; the user id becomes the request's [`CallerIdentity`]. With no
//! secret configured the middleware admits every request without an
//! identity, so read routes work and appends fail as unauthenticated.

use std::convert::Infallible;

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fcm_core::UserId;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use crate::error::{ErrorBody, ErrorDetail};

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The authenticated user of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
}

/// Extractor for the caller, if the request carries one.
#[derive(Debug, Clone)]
pub struct Caller(pub Option<CallerIdentity>);

impl Caller {
    pub fn user_id(&self) -> Option<&UserId> {
        self.0.as_ref().map(|c| &c.user_id)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<CallerIdentity>().cloned()))
    }
}

// ── Auth Configuration ──────────────────────────────────────────────────────

/// Auth configuration injected into request extensions.
///
/// Custom `Debug` redacts the secret.
#[derive(Clone)]
pub struct AuthConfig {
    pub secret: Option<Zeroizing<String>>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

// ── Token Validation ────────────────────────────────────────────────────────

/// Constant-time comparison of secrets. On a length mismatch a dummy
/// comparison still runs.
fn constant_time_token_eq(provided: &str, expected: &str) -> bool {
    let provided = provided.as_bytes();
    let expected = expected.as_bytes();
    if provided.len() != expected.len() {
        let _ = expected.ct_eq(expected);
        return false;
    }
    provided.ct_eq(expected).into()
}

/// Parse a bearer token of the form `{user_id}:{secret}`.
///
/// The user id is everything before the first `:`; the secret may itself
/// contain `:`.
pub fn parse_bearer_token(provided: &str, expected_secret: &str) -> Result<CallerIdentity, String> {
    let Some((user, secret)) = provided.split_once(':') else {
        return Err("invalid token format, expected {user_id}:{secret}".into());
    };
    if !constant_time_token_eq(secret, expected_secret) {
        return Err("invalid bearer token".into());
    }
    let user_id = UserId::new(user).map_err(|e| format!("invalid user id: {e}"))?;
    Ok(CallerIdentity { user_id })
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Validate the bearer token and inject the [`CallerIdentity`].
pub async fn auth_middleware(mut request: Request, next: Next) -> Response {
    let expected = request
        .extensions()
        .get::<AuthConfig>()
        .and_then(|c| c.secret.clone());

    let Some(expected) = expected else {
        return next.run(request).await;
    };

    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth_header {
        Some(value) => match value.strip_prefix("Bearer ") {
            Some(provided) => match parse_bearer_token(provided, expected.as_str()) {
                Ok(identity) => {
                    request.extensions_mut().insert(identity);
                    next.run(request).await
                }
                Err(msg) => {
                    tracing::warn!(reason = %msg, "authentication failed: invalid bearer token");
                    unauthorized_response(&msg)
                }
            },
            None => {
                tracing::warn!("authentication failed: non-Bearer authorization scheme");
                unauthorized_response("authorization header must use Bearer scheme")
            }
        },
        None => {
            tracing::warn!("authentication failed: missing authorization header");
            unauthorized_response("missing authorization header")
        }
    }
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorBody {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
        },
    };
    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn whoami(caller: Caller) -> String {
        caller
            .user_id()
            .map(|u| u.as_str().to_string())
            .unwrap_or_else(|| "anonymous".to_string())
    }

    fn test_app(secret: Option<&str>) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn(auth_middleware))
            .layer(axum::Extension(AuthConfig {
                secret: secret.map(|s| Zeroizing::new(s.to_string())),
            }))
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let response = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_token_binds_user() {
        let (status, body) = call(test_app(Some("s3cret")), Some("Bearer u-17:s3cret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "u-17");
    }

    #[tokio::test]
    async fn wrong_secret_is_rejected() {
        let (status, _) = call(test_app(Some("s3cret")), Some("Bearer u-17:guess")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let (status, body) = call(test_app(Some("s3cret")), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("missing authorization header"));
    }

    #[tokio::test]
    async fn basic_scheme_is_rejected() {
        let (status, _) = call(test_app(Some("s3cret")), Some("Basic dTpz")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn disabled_auth_admits_without_identity() {
        let (status, body) = call(test_app(None), Some("Bearer u-17:whatever")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "anonymous");
    }

    #[test]
    fn secret_may_contain_colons() {
        let identity = parse_bearer_token("u-1:a:b:c", "a:b:c").unwrap();
        assert_eq!(identity.user_id.as_str(), "u-1");
    }

    #[test]
    fn blank_user_is_rejected() {
        assert!(parse_bearer_token(" :s3cret", "s3cret").is_err());
    }

    #[test]
    fn token_without_separator_is_rejected() {
        assert!(parse_bearer_token("s3cret", "s3cret").is_err());
    }
}
