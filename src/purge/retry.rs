// src/purge/retry.rs

//! Retry with exponential backoff around a purge transport.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{PurgeTarget, RetryConfig};
use crate::purge::PurgeTransport;

/// Bounded retry schedule.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: config.initial_backoff(),
            max_backoff: config.max_backoff(),
            backoff_multiplier: config.backoff_multiplier,
        }
    }

    /// Delay after the given failed attempt (0-indexed).
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi(attempt as i32);
        let capped_ms = backoff_ms.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped_ms as u64)
    }
}

/// A transport that retries transient failures of another transport.
pub struct RetryingTransport<T> {
    inner: T,
    policy: RetryPolicy,
}

impl<T> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<T: PurgeTransport> PurgeTransport for RetryingTransport<T> {
    async fn purge(&self, target: &PurgeTarget, keys: &[String], soft_purge: bool) -> Result<()> {
        let mut attempt = 0;
        loop {
            match self.inner.purge(target, keys, soft_purge).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt + 1 < self.policy.max_attempts => {
                    let backoff = self.policy.backoff_for_attempt(attempt);
                    log::warn!(
                        "Purge attempt {}/{} for {} failed: {}. Retrying in {:?}",
                        attempt + 1,
                        self.policy.max_attempts,
                        target.domain,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
