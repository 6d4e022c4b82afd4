// src/services/announce.rs

//! Announcement key builder.
//!
//! Maps the day's announcement rows to the cache keys they invalidate.
//! Every row purges its abstract page; what else is purged depends on how
//! the paper changed:
//!
//! | method    | paper keys                 | listing keys                  |
//! |-----------|----------------------------|-------------------------------|
//! | new       | current, v1                | none                          |
//! | cross     | none                       | current categories, tallies   |
//! | rep       | current, new version       | current categories            |
//! | jref      | none                       | current categories            |
//! | wdr       | withdrawn version          | current categories            |
//!
//! New papers are left off listing pages here because the new, recent and
//! current listings are purged wholesale through the `announce` key.

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::keys;
use crate::models::{AnnouncementMethod, AnnouncementRecord, CacheKeySet, PaperId, Taxonomy};
use crate::services::list_keys;

/// A row whose contribution to the batch was reduced.
#[derive(Debug, Clone, Serialize)]
pub struct RecordFailure {
    pub paper_id: String,
    pub method: String,
    pub message: String,
}

/// Keys for a batch plus the rows that could not be fully processed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchKeys {
    pub keys: CacheKeySet,
    pub failures: Vec<RecordFailure>,
}

/// Builds purge keys for announcement rows.
pub struct AnnouncementKeyBuilder<'a> {
    taxonomy: &'a Taxonomy,
}

impl<'a> AnnouncementKeyBuilder<'a> {
    pub fn new(taxonomy: &'a Taxonomy) -> Self {
        Self { taxonomy }
    }

    /// Keys for the whole batch.
    pub fn build(&self, records: &[AnnouncementRecord]) -> CacheKeySet {
        self.build_report(records).keys
    }

    /// Keys for the whole batch, reporting rows that failed.
    ///
    /// A row with an unparseable id is skipped. A row whose categories do
    /// not resolve still contributes its paper keys.
    pub fn build_report(&self, records: &[AnnouncementRecord]) -> BatchKeys {
        let mut batch = BatchKeys::default();

        for record in records {
            let mut paper_keys = CacheKeySet::new();
            let outcome = self.record_keys(record, &mut paper_keys);
            batch.keys.merge(paper_keys);

            if let Err(e) = outcome {
                log::error!(
                    "Announcement row {} ({}) only partially purged: {}. categories: '{}', extra: '{}'",
                    record.paper_id,
                    record.method,
                    e,
                    record.categories,
                    record.extra
                );
                batch.failures.push(RecordFailure {
                    paper_id: record.paper_id.clone(),
                    method: record.method.to_string(),
                    message: e.to_string(),
                });
            }
        }

        log::debug!(
            "{} announcement rows produced {} keys ({} failures)",
            records.len(),
            batch.keys.len(),
            batch.failures.len()
        );
        batch
    }

    /// Add the keys for one row to `out`.
    ///
    /// Keys are written as they are derived, so on a taxonomy error `out`
    /// still holds the paper keys computed before it.
    pub fn record_keys(&self, record: &AnnouncementRecord, out: &mut CacheKeySet) -> Result<()> {
        let paper_id = PaperId::parse(&record.paper_id)
            .ok_or_else(|| AppError::InvalidPaperId(record.paper_id.clone()))?;
        let id = paper_id.id();
        let (year, month) = (paper_id.year(), paper_id.month());

        out.insert(keys::abs(id));

        match &record.method {
            AnnouncementMethod::New => {
                out.insert(keys::paper_current(id));
                out.insert(keys::paper_version(id, 1));
            }
            AnnouncementMethod::Cross => {
                for archive in self.taxonomy.archives_lenient(&record.extra) {
                    out.insert(keys::year_tally(&archive, year));
                }
                self.add_list_keys(record, year, month, out)?;
            }
            AnnouncementMethod::Replace => {
                out.insert(keys::paper_current(id));
                out.insert(keys::paper_version(id, record.version));
                self.add_list_keys(record, year, month, out)?;
            }
            AnnouncementMethod::Jref => {
                self.add_list_keys(record, year, month, out)?;
            }
            AnnouncementMethod::Withdrawn => {
                out.insert(keys::paper_version(id, record.version));
                self.add_list_keys(record, year, month, out)?;
            }
            AnnouncementMethod::Unrecognized(raw) => {
                log::warn!(
                    "Unrecognized announcement type '{}' for {}; purging abstract only",
                    raw,
                    record.paper_id
                );
            }
        }

        Ok(())
    }

    fn add_list_keys(
        &self,
        record: &AnnouncementRecord,
        year: u16,
        month: u8,
        out: &mut CacheKeySet,
    ) -> Result<()> {
        let resolved = self.taxonomy.resolve(&record.categories)?;
        out.merge(list_keys(year, month, &resolved));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TAXONOMY;

    fn build(records: &[AnnouncementRecord]) -> CacheKeySet {
        AnnouncementKeyBuilder::new(&TAXONOMY).build(records)
    }

    fn assert_contains_all(keys: &CacheKeySet, expected: &[&str]) {
        for key in expected {
            assert!(keys.contains(key), "missing {key} in {keys:?}");
        }
    }

    #[test]
    fn test_new() {
        let keys = build(&[AnnouncementRecord::new("1204.1234", 1, "new", "math.NA", "")]);
        let expected: CacheKeySet = [
            "abs-1204.1234",
            "paper-id-1204.1234-current",
            "paper-id-1204.1234v1",
        ]
        .into_iter()
        .collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_cross() {
        let keys = build(&[AnnouncementRecord::new(
            "1104.1234",
            3,
            "cross",
            "hep-lat astro-ph.SR",
            "astro-ph.SR",
        )]);
        assert_contains_all(
            &keys,
            &[
                "abs-1104.1234",
                "year-astro-ph-2011",
                "list-2011-04-hep-lat",
                "list-2011-hep-lat",
                "list-2011-04-astro-ph.SR",
                "list-2011-astro-ph.SR",
                "list-2011-04-astro-ph",
                "list-2011-astro-ph",
                "list-2011-04-grp_physics",
            ],
        );
        assert!(!keys.contains("paper-id-1104.1234-current"));
        assert!(!keys.contains("paper-id-1104.1234v3"));
    }

    #[test]
    fn test_cross_tally_for_unknown_extra() {
        let keys = build(&[AnnouncementRecord::new(
            "1104.1234",
            1,
            "cross",
            "hep-lat",
            "newarch.XY",
        )]);
        assert!(keys.contains("year-newarch-2011"));
    }

    #[test]
    fn test_replace() {
        let keys = build(&[AnnouncementRecord::new("1204.1234", 2, "rep", "math.NA", "")]);
        assert_contains_all(
            &keys,
            &[
                "abs-1204.1234",
                "paper-id-1204.1234-current",
                "paper-id-1204.1234v2",
                "list-2012-04-math.NA",
                "list-2012-math",
            ],
        );
        assert!(!keys.contains("paper-id-1204.1234v1"));
    }

    #[test]
    fn test_jref() {
        let keys = build(&[AnnouncementRecord::new("1204.1234", 4, "jref", "math.NA", "")]);
        assert_contains_all(&keys, &["abs-1204.1234", "list-2012-04-math.NA"]);
        assert!(keys.iter().all(|key| !key.starts_with("paper-id-")));
    }

    #[test]
    fn test_withdrawn() {
        let keys = build(&[AnnouncementRecord::new("1112.1234", 1, "wdr", "cs.GL", "")]);
        assert_contains_all(
            &keys,
            &[
                "abs-1112.1234",
                "paper-id-1112.1234v1",
                "list-2011-12-cs.GL",
                "list-2011-cs.GL",
                "list-2011-12-cs",
                "list-2011-cs",
            ],
        );
        assert!(!keys.contains("paper-id-1112.1234-current"));
    }

    #[test]
    fn test_unrecognized_method_purges_abstract_only() {
        let keys = build(&[AnnouncementRecord::new("1204.1234", 1, "xyz", "math.NA", "")]);
        let expected: CacheKeySet = ["abs-1204.1234"].into_iter().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_legacy_id() {
        let keys = build(&[AnnouncementRecord::new("cs/0005003", 2, "jref", "cs.GL", "")]);
        assert_contains_all(&keys, &["abs-cs/0005003", "list-2000-05-cs.GL"]);
    }

    #[test]
    fn test_idempotent() {
        let records = [
            AnnouncementRecord::new("1104.1234", 3, "cross", "hep-lat astro-ph.SR", "astro-ph.SR"),
            AnnouncementRecord::new("1204.1234", 2, "rep", "math.NA", ""),
        ];
        assert_eq!(build(&records), build(&records));
    }

    #[test]
    fn test_dedup_across_rows() {
        let records = [
            AnnouncementRecord::new("1204.1111", 2, "rep", "math.NA", ""),
            AnnouncementRecord::new("1204.2222", 1, "jref", "math.NA math.AG", ""),
        ];
        let keys = build(&records);
        let listing: Vec<_> = keys
            .iter()
            .filter(|key| *key == "list-2012-04-math")
            .collect();
        assert_eq!(listing.len(), 1);

        let as_vec = keys.to_vec();
        let mut deduped = as_vec.clone();
        deduped.dedup();
        assert_eq!(as_vec.len(), deduped.len());
    }

    #[test]
    fn test_bad_categories_keep_paper_keys() {
        let builder = AnnouncementKeyBuilder::new(&TAXONOMY);
        let records = [
            AnnouncementRecord::new("1204.1234", 2, "rep", "math.NA bogus", ""),
            AnnouncementRecord::new("1112.1234", 1, "wdr", "cs.GL", ""),
        ];
        let batch = builder.build_report(&records);

        assert_contains_all(
            &batch.keys,
            &[
                "abs-1204.1234",
                "paper-id-1204.1234-current",
                "paper-id-1204.1234v2",
                "list-2011-12-cs.GL",
            ],
        );
        assert!(!batch.keys.contains("list-2012-04-math.NA"));
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].paper_id, "1204.1234");
    }

    #[test]
    fn test_bad_paper_id_skips_row() {
        let builder = AnnouncementKeyBuilder::new(&TAXONOMY);
        let records = [
            AnnouncementRecord::new("garbage", 1, "new", "math.NA", ""),
            AnnouncementRecord::new("1204.1234", 1, "new", "math.NA", ""),
        ];
        let batch = builder.build_report(&records);
        assert_eq!(batch.keys.len(), 3);
        assert!(batch.keys.iter().all(|key| !key.contains("garbage")));
        assert_eq!(batch.failures.len(), 1);
    }
}
