//! Announcement data sources.
//!
//! The purger reads, never writes. Both backends share one layout:
//!
//! ```text
//! {root}/
//! ├── metadata.json            # Latest version and categories per paper
//! └── mailings/
//!     ├── 2024-05-13.json      # Announcement records for one mailing
//!     └── 2024-05-14.json
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{AnnouncementRecord, PaperMetadata};

pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Object keys shared by the storage backends.
pub mod paths {
    use chrono::NaiveDate;

    pub const METADATA: &str = "metadata.json";

    /// Key of the mailing file for `date`.
    pub fn mailing(date: NaiveDate) -> String {
        format!("mailings/{}.json", date.format("%Y-%m-%d"))
    }
}

/// Read access to announcement records and paper metadata.
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    /// Records announced on `date`; empty when there was no mailing.
    async fn load_announcements(&self, date: NaiveDate) -> Result<Vec<AnnouncementRecord>>;

    /// Latest metadata for a paper, `None` if unknown.
    async fn load_metadata(&self, paper_id: &str) -> Result<Option<PaperMetadata>>;
}

/// Find a paper in a metadata listing, ignoring any version suffix on the query.
pub(crate) fn find_metadata(rows: Vec<PaperMetadata>, paper_id: &str) -> Option<PaperMetadata> {
    let wanted = crate::models::PaperId::parse(paper_id)
        .map(|id| id.id().to_string())
        .unwrap_or_else(|| paper_id.to_string());
    rows.into_iter().find(|row| row.paper_id == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mailing_path() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        assert_eq!(paths::mailing(date), "mailings/2024-05-03.json");
    }

    #[test]
    fn test_find_metadata_strips_version() {
        let rows = vec![PaperMetadata {
            paper_id: "cs/0005003".to_string(),
            version: 3,
            categories: "cs.LG".to_string(),
        }];
        let found = find_metadata(rows, "cs/0005003v2").unwrap();
        assert_eq!(found.version, 3);
    }
}
