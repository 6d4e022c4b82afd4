//! Announcement rows and paper metadata read from the announcement store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How a paper changed in an announcement.
///
/// Stored values use the mailing table spelling (`new`, `cross`, `rep`,
/// `jref`, `wdr`); the long names are accepted too. Anything else is kept
/// as `Unrecognized` so the row still purges its abstract page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AnnouncementMethod {
    New,
    Cross,
    Replace,
    Jref,
    Withdrawn,
    Unrecognized(String),
}

impl AnnouncementMethod {
    pub fn as_str(&self) -> &str {
        match self {
            AnnouncementMethod::New => "new",
            AnnouncementMethod::Cross => "cross",
            AnnouncementMethod::Replace => "rep",
            AnnouncementMethod::Jref => "jref",
            AnnouncementMethod::Withdrawn => "wdr",
            AnnouncementMethod::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for AnnouncementMethod {
    fn from(raw: String) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "new" => AnnouncementMethod::New,
            "cross" => AnnouncementMethod::Cross,
            "rep" | "replace" => AnnouncementMethod::Replace,
            "jref" => AnnouncementMethod::Jref,
            "wdr" | "withdrawn" => AnnouncementMethod::Withdrawn,
            _ => AnnouncementMethod::Unrecognized(raw),
        }
    }
}

impl From<&str> for AnnouncementMethod {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<AnnouncementMethod> for String {
    fn from(method: AnnouncementMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for AnnouncementMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the day's announcement batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncementRecord {
    /// Paper id without version
    pub paper_id: String,

    /// Version being announced
    pub version: u32,

    /// How the paper changed
    #[serde(rename = "type", alias = "method")]
    pub method: AnnouncementMethod,

    /// Current whitespace-separated categories
    #[serde(default)]
    pub categories: String,

    /// Method-specific data; categories added by a cross-list
    #[serde(default)]
    pub extra: String,
}

impl AnnouncementRecord {
    pub fn new(
        paper_id: impl Into<String>,
        version: u32,
        method: impl Into<AnnouncementMethod>,
        categories: impl Into<String>,
        extra: impl Into<String>,
    ) -> Self {
        Self {
            paper_id: paper_id.into(),
            version,
            method: method.into(),
            categories: categories.into(),
            extra: extra.into(),
        }
    }
}

/// Latest known state of a paper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub paper_id: String,

    /// Latest version
    pub version: u32,

    /// Current whitespace-separated categories
    pub categories: String,
}
