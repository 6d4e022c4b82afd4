// src/pipeline/paper.rs

//! Whole-paper purge pipeline.

use crate::error::{AppError, Result};
use crate::models::{PaperPurgeRequest, TAXONOMY};
use crate::pipeline::PurgeSummary;
use crate::purge::Invalidator;
use crate::services::paper_keys;
use crate::storage::AnnouncementStore;

/// Purge every page of a paper, including listings it left when
/// `old_categories` is given.
pub async fn run_paper_purge(
    store: &dyn AnnouncementStore,
    request: &PaperPurgeRequest,
    invalidator: &Invalidator,
) -> Result<PurgeSummary> {
    let metadata = store
        .load_metadata(&request.paper_id)
        .await?
        .ok_or_else(|| AppError::validation(format!("No metadata for paper {}", request.paper_id)))?;

    let keys = paper_keys(&TAXONOMY, &metadata, request.old_categories())?.to_vec();
    log::info!("Purging {} keys for paper {}", keys.len(), metadata.paper_id);

    let mut summary = PurgeSummary::new("paper");
    summary.reports.push(invalidator.invalidate(&keys, false).await);
    summary.keys = keys;
    Ok(summary)
}
