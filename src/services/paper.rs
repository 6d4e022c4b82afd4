// src/services/paper.rs

//! Keys for purging everything related to one paper.
//!
//! Used after metadata corrections outside the announcement cycle. When the
//! paper was reclassified, listings it left and archive tallies it moved
//! between are purged too.

use crate::error::{AppError, Result};
use crate::models::keys;
use crate::models::{ArtifactKind, CacheKeySet, PaperId, PaperMetadata, Taxonomy};
use crate::services::list_keys;

/// Build the keys for a paper given its current metadata.
pub fn paper_keys(
    taxonomy: &Taxonomy,
    metadata: &PaperMetadata,
    old_categories: Option<&str>,
) -> Result<CacheKeySet> {
    let paper_id = PaperId::parse(&metadata.paper_id)
        .ok_or_else(|| AppError::InvalidPaperId(metadata.paper_id.clone()))?;
    let id = paper_id.id();
    let (year, month) = (paper_id.year(), paper_id.month());

    let mut out = CacheKeySet::new();
    out.insert(keys::abs(id));
    out.insert(keys::paper_current(id));
    out.extend((1..=metadata.version).map(|version| keys::paper_version(id, version)));
    out.insert(keys::artifact_current(ArtifactKind::Pdf, id));
    out.insert(keys::artifact_current(ArtifactKind::Html, id));

    let current = taxonomy.resolve(&metadata.categories)?;
    out.merge(list_keys(year, month, &current));

    if let Some(old_categories) = old_categories {
        let old = taxonomy.resolve(old_categories)?;
        out.merge(list_keys(year, month, &old));
        for archive in old.archives.symmetric_difference(&current.archives) {
            out.insert(keys::year_tally(archive, year));
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TAXONOMY;

    fn metadata(categories: &str) -> PaperMetadata {
        PaperMetadata {
            paper_id: "1205.1234".to_string(),
            version: 2,
            categories: categories.to_string(),
        }
    }

    #[test]
    fn test_paper_keys_without_old_categories() {
        let keys = paper_keys(&TAXONOMY, &metadata("cs.NA"), None).unwrap();
        for key in [
            "abs-1205.1234",
            "paper-id-1205.1234-current",
            "paper-id-1205.1234v1",
            "paper-id-1205.1234v2",
            "pdf-1205.1234-current",
            "html-1205.1234-current",
            "list-2012-05-cs.NA",
            "list-2012-cs",
        ] {
            assert!(keys.contains(key), "missing {key}");
        }
        assert!(keys.iter().all(|key| !key.starts_with("year-")));
    }

    #[test]
    fn test_paper_keys_with_reclassification() {
        let keys = paper_keys(&TAXONOMY, &metadata("cs.NA"), Some("hep-lat cs.NA")).unwrap();
        assert!(keys.contains("list-2012-05-hep-lat"));
        assert!(keys.contains("list-2012-05-grp_physics"));
        assert!(keys.contains("year-hep-lat-2012"));
        assert!(!keys.contains("year-cs-2012"));
    }

    #[test]
    fn test_paper_keys_bad_categories() {
        let err = paper_keys(&TAXONOMY, &metadata("cs.NA"), Some("not.real")).unwrap_err();
        assert!(matches!(err, AppError::UnknownCategory { .. }));
    }

    #[test]
    fn test_paper_keys_bad_id() {
        let mut meta = metadata("cs.NA");
        meta.paper_id = "nonsense".to_string();
        assert!(matches!(
            paper_keys(&TAXONOMY, &meta, None),
            Err(AppError::InvalidPaperId(_))
        ));
    }
}
