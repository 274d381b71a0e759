//! # Application State
//!
//! Shared state handed to every handler: the custody ledger, the loaded
//! configuration, and request metrics.

use std::sync::Arc;

use fcm_custody::ledger::DEFAULT_CAS_ATTEMPTS;
use fcm_custody::{ConcurrencyMode, CustodyLedger, MemoryDirectory, MemoryRecordStore};
use zeroize::Zeroizing;

use crate::middleware::metrics::ApiMetrics;

/// Server configuration.
///
/// Custom `Debug` redacts the auth secret.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Shared secret of the `Bearer <user_id>:<secret>` scheme. If `None`,
    /// authentication is disabled and no request carries an actor.
    pub auth_secret: Option<Zeroizing<String>>,
    /// How custody appends guard against concurrent writers.
    pub append_mode: ConcurrencyMode,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field(
                "auth_secret",
                &self.auth_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("append_mode", &self.append_mode)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            auth_secret: None,
            append_mode: ConcurrencyMode::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `FCM_AUTH_SECRET` (optional)
    /// - `FCM_APPEND_MODE`: `cas` (default) or `last-write-wins`
    /// - `FCM_CAS_ATTEMPTS` (default: 5)
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::Invalid("PORT", raw))?,
            Err(_) => 8080,
        };
        let attempts = match std::env::var("FCM_CAS_ATTEMPTS") {
            Ok(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid("FCM_CAS_ATTEMPTS", raw)),
            },
            Err(_) => DEFAULT_CAS_ATTEMPTS,
        };
        let append_mode = parse_append_mode(
            std::env::var("FCM_APPEND_MODE").ok().as_deref(),
            attempts,
        )?;

        Ok(Self {
            port,
            auth_secret: std::env::var("FCM_AUTH_SECRET")
                .ok()
                .filter(|s| !s.is_empty())
                .map(Zeroizing::new),
            append_mode,
        })
    }
}

fn parse_append_mode(raw: Option<&str>, attempts: u32) -> Result<ConcurrencyMode, ConfigError> {
    match raw.map(str::trim) {
        None | Some("") | Some("cas") => Ok(ConcurrencyMode::CompareAndSwap {
            max_attempts: attempts,
        }),
        Some("last-write-wins") => Ok(ConcurrencyMode::LastWriteWins),
        Some(other) => Err(ConfigError::Invalid("FCM_APPEND_MODE", other.to_string())),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub ledger: Arc<CustodyLedger>,
    pub config: AppConfig,
    pub metrics: ApiMetrics,
}

impl AppState {
    /// State over an existing ledger. The ledger's mode is replaced by the
    /// configured append mode.
    pub fn with_ledger(config: AppConfig, ledger: CustodyLedger) -> Self {
        let ledger = ledger.with_mode(config.append_mode);
        Self {
            ledger: Arc::new(ledger),
            config,
            metrics: ApiMetrics::new(),
        }
    }

    /// State over process-local collaborators.
    pub fn in_memory(config: AppConfig, store: MemoryRecordStore, directory: MemoryDirectory) -> Self {
        Self::with_ledger(
            config,
            CustodyLedger::new(Arc::new(store), Arc::new(directory)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_mode_defaults_to_cas() {
        assert_eq!(
            parse_append_mode(None, 5).unwrap(),
            ConcurrencyMode::CompareAndSwap { max_attempts: 5 }
        );
        assert_eq!(
            parse_append_mode(Some("cas"), 3).unwrap(),
            ConcurrencyMode::CompareAndSwap { max_attempts: 3 }
        );
    }

    #[test]
    fn append_mode_accepts_last_write_wins() {
        assert_eq!(
            parse_append_mode(Some("last-write-wins"), 5).unwrap(),
            ConcurrencyMode::LastWriteWins
        );
    }

    #[test]
    fn append_mode_rejects_unknown() {
        assert!(parse_append_mode(Some("optimistic"), 5).is_err());
    }

    #[test]
    fn debug_redacts_secret() {
        let config = AppConfig {
            auth_secret: Some(Zeroizing::new("hunter2".into())),
            ..AppConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn state_applies_configured_mode() {
        let config = AppConfig {
            append_mode: ConcurrencyMode::LastWriteWins,
            ..AppConfig::default()
        };
        let state = AppState::in_memory(config, MemoryRecordStore::default(), MemoryDirectory::new());
        assert_eq!(state.ledger.mode(), ConcurrencyMode::LastWriteWins);
    }
}
