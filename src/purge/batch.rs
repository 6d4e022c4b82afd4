// src/purge/batch.rs

//! Split large key sets into per-request batches.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::PurgeTarget;
use crate::purge::PurgeTransport;

/// Sends keys to the inner transport at most `max_keys` at a time.
///
/// Wrap a [`RetryingTransport`](crate::purge::RetryingTransport) with this,
/// not the other way round, so a retry only resends the failing batch.
pub struct BatchingTransport<T> {
    inner: T,
    max_keys: usize,
}

impl<T> BatchingTransport<T> {
    pub fn new(inner: T, max_keys: usize) -> Self {
        Self {
            inner,
            max_keys: max_keys.max(1),
        }
    }
}

#[async_trait]
impl<T: PurgeTransport> PurgeTransport for BatchingTransport<T> {
    async fn purge(&self, target: &PurgeTarget, keys: &[String], soft_purge: bool) -> Result<()> {
        for batch in keys.chunks(self.max_keys) {
            self.inner.purge(target, batch, soft_purge).await?;
        }
        Ok(())
    }
}
