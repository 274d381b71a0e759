//! # fcm-api: Chain-of-Custody HTTP Service
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/v1/evidence/{evidence_id}/custody` | [`routes::custody`] | Timeline and entry recording |
//! | `/v1/custody/*` | [`routes::custody`] | Action catalogue and classification |
//! | `/openapi.json` | [`openapi`] | Generated OpenAPI document |
//! | `/health/*` | here | Unauthenticated health checks |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → AuthMiddleware → Handler
//! ```

pub mod auth;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::auth::AuthConfig;
use crate::state::AppState;

/// Assemble the application router with all routes and middleware.
///
/// Health checks are mounted outside the auth middleware.
pub fn app(state: AppState) -> Router {
    let auth_config = AuthConfig {
        secret: state.config.auth_secret.clone(),
    };
    let metrics = state.metrics.clone();

    let api = Router::new()
        .merge(routes::custody::router())
        .merge(openapi::router())
        .layer(from_fn(auth::auth_middleware))
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(axum::Extension(auth_config))
        .layer(axum::Extension(metrics))
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness check.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check.
async fn readiness() -> &'static str {
    "ready"
}
