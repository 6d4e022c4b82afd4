// src/services/storage_keys.rs

//! Storage object key mapper.
//!
//! Rendered PDFs and HTML pages live in object storage under paths that
//! embed the paper id, e.g. `ps_cache/cs/pdf/0005/0005003v1.pdf` or
//! `ps_cache/arxiv/html/0712/0712.3116v1/index.html`. A change to one of
//! those objects purges the versioned and the current page for it.

use crate::models::keys;
use crate::models::{ArtifactKind, ObjectsConfig, PaperId};

/// Maps changed storage objects to cache keys.
#[derive(Debug, Clone)]
pub struct StorageKeyMapper {
    ignored_patterns: Vec<String>,
    html_buckets: Vec<String>,
}

impl Default for StorageKeyMapper {
    fn default() -> Self {
        Self::new(&ObjectsConfig::default())
    }
}

impl StorageKeyMapper {
    pub fn new(config: &ObjectsConfig) -> Self {
        Self {
            ignored_patterns: config.ignored_patterns.clone(),
            html_buckets: config.html_buckets.clone(),
        }
    }

    /// Classify an object path by the artifact it holds.
    pub fn classify(&self, bucket: &str, key: &str) -> Option<ArtifactKind> {
        if key.contains("/html/") {
            Some(ArtifactKind::Html)
        } else if key.ends_with(".pdf") {
            Some(ArtifactKind::Pdf)
        } else if key.ends_with(".html") && self.html_buckets.iter().any(|b| b == bucket) {
            Some(ArtifactKind::Html)
        } else {
            None
        }
    }

    /// Keys to purge for a changed object; empty if nothing should be purged.
    ///
    /// The current key is always included: the changed version may be, or
    /// may later become, the current one.
    pub fn keys_for_change(&self, bucket: &str, key: &str) -> Vec<String> {
        if let Some(pattern) = self.ignored_patterns.iter().find(|p| key.contains(p.as_str())) {
            log::info!("No purge: gs://{bucket}/{key} matches ignored pattern '{pattern}'");
            return Vec::new();
        }

        let Some(kind) = self.classify(bucket, key) else {
            log::info!("No purge: gs://{bucket}/{key} not an html or pdf path");
            return Vec::new();
        };

        let Some(paper_id) = PaperId::parse(key) else {
            log::info!("No purge: gs://{bucket}/{key} not related to a paper id");
            return Vec::new();
        };

        vec![
            keys::artifact_current(kind, paper_id.id()),
            keys::artifact_version(kind, &paper_id.idv()),
        ]
    }
}
