//! Pipeline entry points for purge operations.
//!
//! - `run_announcement_purge`: Purge everything a day's mailing changed
//! - `run_object_purge`: Purge the pages backed by a changed storage object
//! - `run_paper_purge`: Purge every page of one paper

pub mod announce;
pub mod object;
pub mod paper;

use serde::Serialize;

use crate::purge::PurgeReport;
use crate::services::RecordFailure;

pub use announce::{mailing_date, run_announcement_purge};
pub use object::run_object_purge;
pub use paper::run_paper_purge;

/// Result of one pipeline run, reported by the binaries.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PurgeSummary {
    /// Which pipeline ran
    pub operation: String,
    /// Derived keys, sorted
    pub keys: Vec<String>,
    /// One report per `invalidate` call
    pub reports: Vec<PurgeReport>,
    /// Announcement rows that only partially contributed keys
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub record_failures: Vec<RecordFailure>,
}

impl PurgeSummary {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// True when every target accepted every purge.
    pub fn is_success(&self) -> bool {
        self.reports.iter().all(PurgeReport::is_success)
    }

    pub fn failed_targets(&self) -> usize {
        self.reports.iter().map(|r| r.failed.len()).sum()
    }

    pub fn is_dry_run(&self) -> bool {
        self.reports.iter().any(|r| r.dry_run)
    }
}
