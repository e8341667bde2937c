//! Bounded retry with capped exponential backoff around single requests.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use crate::error::RestApiError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 1000,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Default::default()
        }
    }
}

/// Execute an async operation, retrying transient errors with exponential backoff.
///
/// Only errors for which [`RestApiError::is_transient`] holds are retried; the
/// last error is returned once `max_attempts` is reached.
pub async fn with_retry<F, Fut, T>(config: &RetryConfig, operation: F) -> Result<T, RestApiError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, RestApiError>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let backoff_ms = compute_backoff(config, attempt - 1);
                tracing::warn!(
                    attempt = attempt,
                    max = max_attempts,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
            }
            Err(e) => return Err(e),
        }
    }
}

fn compute_backoff(config: &RetryConfig, retry: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(retry as i32);
    base.min(config.max_backoff_ms as f64) as u64
}
