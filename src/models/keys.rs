//! Cache key grammar.
//!
//! Keys are surrogate tags attached to cached responses by the web tier.
//! The text produced here must match those tags exactly.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Key purged once per announcement for the daily listing pages.
pub const ANNOUNCE: &str = "announce";

/// Rendered artifact served from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Pdf,
    Html,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Pdf => "pdf",
            ArtifactKind::Html => "html",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `abs-<id>`
pub fn abs(id: &str) -> String {
    format!("abs-{id}")
}

/// `paper-id-<id>-current`
pub fn paper_current(id: &str) -> String {
    format!("paper-id-{id}-current")
}

/// `paper-id-<id>v<version>`
pub fn paper_version(id: &str, version: u32) -> String {
    format!("paper-id-{id}v{version}")
}

/// `<kind>-<id>-current`
pub fn artifact_current(kind: ArtifactKind, id: &str) -> String {
    format!("{kind}-{id}-current")
}

/// `<kind>-<idv>`
pub fn artifact_version(kind: ArtifactKind, idv: &str) -> String {
    format!("{kind}-{idv}")
}

/// `list-<YYYY>-<tag>`
pub fn list_year(year: u16, tag: &str) -> String {
    format!("list-{year:04}-{tag}")
}

/// `list-<YYYY>-<MM>-<tag>`
pub fn list_month(year: u16, month: u8, tag: &str) -> String {
    format!("list-{year:04}-{month:02}-{tag}")
}

/// `year-<archive>-<YYYY>`: the archive's yearly paper count changed.
pub fn year_tally(archive: &str, year: u16) -> String {
    format!("year-{archive}-{year:04}")
}

/// Deduplicated set of cache keys.
///
/// Iteration order is lexical so that logs and reports are stable, but
/// nothing downstream depends on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKeySet(BTreeSet<String>);

impl CacheKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key; returns `false` if it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.0.insert(key.into())
    }

    /// Merge another key set into this one.
    pub fn merge(&mut self, other: CacheKeySet) {
        self.0.extend(other.0);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> Extend<S> for CacheKeySet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for CacheKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut keys = Self::new();
        keys.extend(iter);
        keys
    }
}

impl IntoIterator for CacheKeySet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
