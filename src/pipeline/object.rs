// src/pipeline/object.rs

//! Storage change purge pipeline.

use crate::models::StorageChangeEvent;
use crate::pipeline::PurgeSummary;
use crate::purge::Invalidator;
use crate::services::StorageKeyMapper;

/// Purge the pages backed by a changed object. Nothing is sent for objects
/// that do not map to any key.
pub async fn run_object_purge(
    event: &StorageChangeEvent,
    mapper: &StorageKeyMapper,
    invalidator: &Invalidator,
) -> PurgeSummary {
    let mut summary = PurgeSummary::new("object");
    let keys = mapper.keys_for_change(&event.bucket, &event.name);
    if keys.is_empty() {
        return summary;
    }

    summary.reports.push(invalidator.invalidate(&keys, false).await);
    summary.keys = keys;
    summary
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::purge::testing::{RecordingTransport, target};

    fn invalidator(transport: &Arc<RecordingTransport>) -> Invalidator {
        Invalidator::new(transport.clone(), vec![target("arxiv.org")])
    }

    #[tokio::test]
    async fn test_pdf_change() {
        let transport = Arc::new(RecordingTransport::default());
        let event = StorageChangeEvent::new("bucket", "ps_cache/arxiv/pdf/2409/2409.10823v1.pdf");

        let summary =
            run_object_purge(&event, &StorageKeyMapper::default(), &invalidator(&transport)).await;

        assert_eq!(summary.keys, ["pdf-2409.10823-current", "pdf-2409.10823v1"]);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_unrelated_change_sends_nothing() {
        let transport = Arc::new(RecordingTransport::default());
        let event = StorageChangeEvent::new("bucket", "ps_cache/arxiv/html/0712/0712.3116v1/LaTeXML.cache");

        let summary =
            run_object_purge(&event, &StorageKeyMapper::default(), &invalidator(&transport)).await;

        assert!(summary.keys.is_empty());
        assert!(summary.reports.is_empty());
        assert!(transport.calls().is_empty());
    }
}
