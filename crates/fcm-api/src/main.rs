//! # fcm-api: Binary Entry Point
//!
//! Starts the custody ledger HTTP server. Uses the hosted backend when
//! `FCM_BACKEND_URL` is set, otherwise an empty in-memory store.

use std::sync::Arc;

use anyhow::Context;
use fcm_api::state::{AppConfig, AppState};
use fcm_backend::{BackendClient, BackendConfig, BackendStore};
use fcm_custody::{CustodyLedger, MemoryDirectory, MemoryRecordStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().context("loading server configuration")?;
    tracing::info!(?config, "configuration loaded");
    if config.auth_secret.is_none() {
        tracing::warn!("FCM_AUTH_SECRET not set; custody entries cannot be recorded");
    }
    let port = config.port;

    let state = if BackendConfig::is_configured() {
        let backend_config = BackendConfig::from_env().context("loading backend configuration")?;
        tracing::info!(base_url = %backend_config.base_url, "backend store configured");
        let store = Arc::new(BackendStore::new(
            BackendClient::new(backend_config).context("building backend client")?,
        ));
        AppState::with_ledger(config, CustodyLedger::new(store.clone(), store))
    } else {
        tracing::warn!("FCM_BACKEND_URL not set; serving an empty in-memory store");
        AppState::in_memory(config, MemoryRecordStore::versioned(), MemoryDirectory::new())
    };

    let app = fcm_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("FCM API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
