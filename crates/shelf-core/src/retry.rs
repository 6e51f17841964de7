//! Bounded retry with exponential backoff for transient store failures.
//!
//! Deterministic failures (authorization, validation, not-found) are never
//! retried; retrying them changes nothing. Only errors classified as
//! transient by [`AppError::is_transient`] are attempted again.

use std::time::Duration;

use tracing::warn;

use crate::config::store::StoreConfig;
use crate::error::AppError;
use crate::result::AppResult;

/// Retry policy applied at the repository/gateway boundary.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum total attempts (first try included).
    pub max_attempts: u32,
    /// Base delay between attempts, doubled each retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Build a policy from the store configuration section.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            max_attempts: config.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before the given retry attempt (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

/// Run `op` until it succeeds, fails deterministically, or the policy's
/// attempt budget is exhausted.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, op_name: &str, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    op = op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient store failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
