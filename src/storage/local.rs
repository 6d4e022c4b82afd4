//! Local filesystem storage implementation.
//!
//! Reads the mailing and metadata files from a directory. Used for
//! development, replaying a past mailing, and tests.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRecord, PaperMetadata};
use crate::storage::{AnnouncementStore, find_metadata, paths};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AnnouncementStore for LocalStorage {
    async fn load_announcements(&self, date: NaiveDate) -> Result<Vec<AnnouncementRecord>> {
        let key = paths::mailing(date);
        match self.read_json(&key).await? {
            Some(records) => Ok(records),
            None => {
                log::warn!("No mailing at {}", self.path(&key).display());
                Ok(Vec::new())
            }
        }
    }

    async fn load_metadata(&self, paper_id: &str) -> Result<Option<PaperMetadata>> {
        let rows: Vec<PaperMetadata> = self.read_json(paths::METADATA).await?.unwrap_or_default();
        Ok(find_metadata(rows, paper_id))
    }
}
