// src/pipeline/announce.rs

//! Announcement purge pipeline.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};

use crate::error::Result;
use crate::models::{TAXONOMY, keys};
use crate::pipeline::PurgeSummary;
use crate::purge::Invalidator;
use crate::services::AnnouncementKeyBuilder;
use crate::storage::AnnouncementStore;

/// Hours the announcement calendar lags UTC. Mailings go out at 20:00
/// US Eastern, which is already the next day in UTC.
const MAILING_UTC_OFFSET_HOURS: i64 = 5;

/// Date of the most recent mailing as of `now`.
pub fn mailing_date(now: DateTime<Utc>) -> NaiveDate {
    (now - TimeDelta::hours(MAILING_UTC_OFFSET_HOURS)).date_naive()
}

/// Purge the pages changed by the mailing of `date`, then the global
/// `announce` key on every announce target.
pub async fn run_announcement_purge(
    store: &dyn AnnouncementStore,
    date: NaiveDate,
    invalidator: &Invalidator,
    announce_invalidator: &Invalidator,
) -> Result<PurgeSummary> {
    let records = store.load_announcements(date).await?;
    if records.is_empty() {
        log::warn!(
            "No announcement rows for {}; only `{}` will be purged",
            date,
            keys::ANNOUNCE
        );
    } else {
        log::info!("Loaded {} announcement rows for {}", records.len(), date);
    }

    let batch = AnnouncementKeyBuilder::new(&TAXONOMY).build_report(&records);
    let keys = batch.keys.to_vec();

    let mut summary = PurgeSummary::new("announce");
    summary.reports.push(invalidator.invalidate(&keys, false).await);

    let announce = [keys::ANNOUNCE.to_string()];
    summary
        .reports
        .push(announce_invalidator.invalidate(&announce, false).await);

    summary.keys = keys;
    summary.record_failures = batch.failures;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tempfile::TempDir;

    use super::*;
    use crate::purge::testing::{RecordingTransport, target};
    use crate::storage::LocalStorage;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 13).unwrap()
    }

    fn store(body: &str) -> (TempDir, LocalStorage) {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("mailings")).unwrap();
        std::fs::write(dir.path().join("mailings/2024-05-13.json"), body).unwrap();
        let storage = LocalStorage::new(dir.path());
        (dir, storage)
    }

    #[tokio::test]
    async fn test_announcement_purge() {
        let (_dir, store) = store(
            r#"[
                {"paper_id": "2405.01234", "version": 1, "type": "new", "categories": "cs.LG"},
                {"paper_id": "2301.00001", "version": 3, "type": "rep", "categories": "math.CO"},
                {"paper_id": "garbage", "version": 1, "type": "new", "categories": "cs.LG"}
            ]"#,
        );
        let transport = Arc::new(RecordingTransport::default());
        let papers = Invalidator::new(transport.clone(), vec![target("arxiv.org")]);
        let announce = Invalidator::new(
            transport.clone(),
            vec![target("arxiv.org"), target("rss.arxiv.org")],
        );

        let summary = run_announcement_purge(&store, date(), &papers, &announce)
            .await
            .unwrap();

        assert!(summary.is_success());
        assert!(summary.keys.contains(&"abs-2405.01234".to_string()));
        assert!(summary.keys.contains(&"paper-id-2301.00001v3".to_string()));
        assert!(summary.keys.contains(&"list-2023-01-math.CO".to_string()));
        assert_eq!(summary.record_failures.len(), 1);

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].keys, summary.keys);
        assert_eq!(calls[1].keys, ["announce"]);
        assert_eq!(calls[2].domain, "rss.arxiv.org");
    }

    #[test]
    fn test_mailing_date_around_announcement() {
        let at = |s: &str| DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc);
        // 20:05 EDT and 20:05 EST
        assert_eq!(mailing_date(at("2024-05-14T00:05:00Z")), date());
        assert_eq!(
            mailing_date(at("2024-01-16T01:05:00Z")),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(mailing_date(at("2024-05-13T23:00:00Z")), date());
    }

    #[tokio::test]
    async fn test_no_mailing_still_purges_announce() {
        let dir = TempDir::new().unwrap();
        let store = LocalStorage::new(dir.path());
        let transport = Arc::new(RecordingTransport::default());
        let invalidator = Invalidator::new(transport.clone(), vec![target("arxiv.org")]);

        let summary = run_announcement_purge(&store, date(), &invalidator, &invalidator)
            .await
            .unwrap();

        assert!(summary.keys.is_empty());
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].keys, ["announce"]);
    }
}
