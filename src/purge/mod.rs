//! Purge dispatch.
//!
//! [`Invalidator`] hands a computed key set to a [`PurgeTransport`] for
//! every configured CDN target. The transport owns the network call and its
//! retry policy; the invalidator only decides between a real purge and a
//! logged dry run, and whether the purge is soft.

pub mod batch;
pub mod fastly;
pub mod retry;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Config, PurgeTarget, TargetKind};

pub use batch::BatchingTransport;
pub use fastly::FastlyTransport;
pub use retry::{RetryPolicy, RetryingTransport};

/// Sends purge requests to a CDN.
#[async_trait]
pub trait PurgeTransport: Send + Sync {
    /// Purge `keys` on `target`. A soft purge marks content stale instead
    /// of evicting it.
    async fn purge(&self, target: &PurgeTarget, keys: &[String], soft_purge: bool) -> Result<()>;
}

#[async_trait]
impl<T: PurgeTransport + ?Sized> PurgeTransport for Arc<T> {
    async fn purge(&self, target: &PurgeTarget, keys: &[String], soft_purge: bool) -> Result<()> {
        (**self).purge(target, keys, soft_purge).await
    }
}

/// The production transport: Fastly behind the configured retry policy,
/// applied per batch of `max_keys_per_request` keys.
pub fn fastly_transport(config: &Config) -> Result<Arc<dyn PurgeTransport>> {
    let fastly = FastlyTransport::from_config(&config.purge)?;
    let policy = RetryPolicy::from_config(&config.retry);
    Ok(Arc::new(BatchingTransport::new(
        RetryingTransport::new(fastly, policy),
        config.purge.max_keys_per_request,
    )))
}

/// A target whose purge failed after retries.
#[derive(Debug, Clone, Serialize)]
pub struct TargetFailure {
    pub domain: String,
    pub message: String,
}

/// Outcome of one `invalidate` call.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeReport {
    pub keys: Vec<String>,
    pub soft_purge: bool,
    pub dry_run: bool,
    pub purged: Vec<String>,
    pub failed: Vec<TargetFailure>,
}

impl PurgeReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Dispatches key sets to the CDN targets of one environment.
#[derive(Clone)]
pub struct Invalidator {
    transport: Arc<dyn PurgeTransport>,
    targets: Vec<PurgeTarget>,
    always_soft_purge: bool,
    dry_run: bool,
}

impl Invalidator {
    pub fn new(transport: Arc<dyn PurgeTransport>, targets: Vec<PurgeTarget>) -> Self {
        Self {
            transport,
            targets,
            always_soft_purge: false,
            dry_run: false,
        }
    }

    /// Build an invalidator for the configured environment.
    pub fn from_config(
        config: &Config,
        kind: TargetKind,
        transport: Arc<dyn PurgeTransport>,
    ) -> Result<Self> {
        Ok(Self::new(transport, config.targets(kind)?)
            .with_always_soft_purge(config.purge.always_soft_purge)
            .with_dry_run(config.is_dry_run()))
    }

    pub fn with_always_soft_purge(mut self, always_soft_purge: bool) -> Self {
        self.always_soft_purge = always_soft_purge;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn targets(&self) -> &[PurgeTarget] {
        &self.targets
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Purge `keys` on every target.
    ///
    /// Failures are logged and reported, never returned: a failed purge
    /// must not abort the rest of the invocation.
    pub async fn invalidate(&self, keys: &[String], soft_purge: bool) -> PurgeReport {
        let soft_purge = self.always_soft_purge || soft_purge;
        let mut report = PurgeReport {
            keys: keys.to_vec(),
            soft_purge,
            dry_run: self.dry_run,
            ..PurgeReport::default()
        };

        if keys.is_empty() {
            return report;
        }

        if self.dry_run {
            log::info!(
                "DRY_RUN: Would have purged keys: {:?} soft purge: {} targets: {:?}",
                keys,
                soft_purge,
                self.targets.iter().map(|t| &t.domain).collect::<Vec<_>>()
            );
            return report;
        }

        if self.targets.is_empty() {
            log::warn!("No purge targets configured; {} keys not purged", keys.len());
        }

        for target in &self.targets {
            match self.transport.purge(target, keys, soft_purge).await {
                Ok(()) => {
                    log::info!(
                        "Purged {} keys on {} (soft: {})",
                        keys.len(),
                        target.domain,
                        soft_purge
                    );
                    report.purged.push(target.domain.clone());
                }
                Err(e) => {
                    log::error!("Purge failed: {:?} on {} failed {}", keys, target.domain, e);
                    report.failed.push(TargetFailure {
                        domain: target.domain.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{RecordingTransport, target};
    use super::*;

    fn keys() -> Vec<String> {
        vec!["abs-1204.1234".to_string(), "paper-id-1204.1234v1".to_string()]
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let invalidator =
            Invalidator::new(transport.clone(), vec![target("arxiv.org")]).with_dry_run(true);

        let report = invalidator.invalidate(&keys(), false).await;
        assert!(report.dry_run);
        assert_eq!(report.keys, keys());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_soft_purge_flags_are_ored() {
        let transport = Arc::new(RecordingTransport::default());
        let invalidator = Invalidator::new(transport.clone(), vec![target("arxiv.org")]);
        invalidator.invalidate(&keys(), false).await;
        invalidator.invalidate(&keys(), true).await;

        let always_soft = invalidator.clone().with_always_soft_purge(true);
        always_soft.invalidate(&keys(), false).await;

        let soft: Vec<bool> = transport.calls().iter().map(|c| c.soft_purge).collect();
        assert_eq!(soft, [false, true, true]);
    }

    #[tokio::test]
    async fn test_each_target_purged_once() {
        let transport = Arc::new(RecordingTransport::default());
        let invalidator = Invalidator::new(
            transport.clone(),
            vec![target("arxiv.org"), target("rss.arxiv.org")],
        );
        let report = invalidator.invalidate(&keys(), false).await;

        assert!(report.is_success());
        assert_eq!(report.purged, ["arxiv.org", "rss.arxiv.org"]);
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].keys, keys());
    }

    #[tokio::test]
    async fn test_failure_is_reported_not_raised() {
        let transport = Arc::new(RecordingTransport::failing(&["rss.arxiv.org"]));
        let invalidator = Invalidator::new(
            transport.clone(),
            vec![target("rss.arxiv.org"), target("arxiv.org")],
        );
        let report = invalidator.invalidate(&keys(), false).await;

        assert!(!report.is_success());
        assert_eq!(report.failed[0].domain, "rss.arxiv.org");
        assert_eq!(report.purged, ["arxiv.org"]);
    }

    #[tokio::test]
    async fn test_empty_keys_skip_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let invalidator = Invalidator::new(transport.clone(), vec![target("arxiv.org")]);
        let report = invalidator.invalidate(&[], false).await;
        assert!(report.is_success());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_fastly_transport_from_default_config() {
        assert!(fastly_transport(&Config::default()).is_ok());
    }

    #[test]
    fn test_from_config_test_environment_is_dry_run() {
        let config = Config::default();
        let invalidator = Invalidator::from_config(
            &config,
            TargetKind::Paper,
            Arc::new(RecordingTransport::default()),
        )
        .unwrap();
        assert!(invalidator.is_dry_run());
        assert!(invalidator.targets().is_empty());
    }
}
