//! Backoff policy for idempotent backend reads.
//!
//! A read is resent when the request never produced a response, or when
//! the backend answered with a status that says "try again later" (any
//! 5xx, or 429). Every other response goes straight back to the caller,
//! which maps the status to a [`crate::BackendError`]. When attempts run
//! out the last outcome is returned as is.
//!
//! Writes never go through here: a PATCH or POST whose response was lost
//! may already have been applied.

use std::future::Future;
use std::time::Duration;

use reqwest::StatusCode;

/// How often, and how patiently, a read is resent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadRetry {
    /// Resends after the first request.
    pub(crate) resends: u32,
    /// Delay before the first resend; doubles for each one after.
    pub(crate) first_delay: Duration,
}

impl ReadRetry {
    /// Policy used by every backend client: 200ms, 400ms, 800ms.
    pub(crate) const STANDARD: Self = Self {
        resends: 3,
        first_delay: Duration::from_millis(200),
    };

    fn delay_before(&self, resend: u32) -> Duration {
        self.first_delay.saturating_mul(1u32 << resend.min(16))
    }

    /// Send the request built by `send`, resending on transport failures
    /// and transient statuses.
    pub(crate) async fn run<F, Fut>(&self, send: F) -> Result<reqwest::Response, reqwest::Error>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut resend = 0;
        loop {
            let outcome = send().await;
            if resend >= self.resends {
                return outcome;
            }
            let reason = match &outcome {
                Ok(resp) if is_transient(resp.status()) => format!("status {}", resp.status()),
                Ok(_) => return outcome,
                Err(e) => e.to_string(),
            };
            let delay = self.delay_before(resend);
            resend += 1;
            tracing::warn!(
                resend,
                resends = self.resends,
                delay_ms = delay.as_millis() as u64,
                "backend read failed ({reason}), resending"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Statuses worth resending a read for.
fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}
