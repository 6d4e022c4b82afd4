//! AWS S3 storage implementation.
//!
//! Same layout as [`LocalStorage`](super::LocalStorage), under
//! `s3://{bucket}/{prefix}/`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{AnnouncementRecord, PaperMetadata};
use crate::storage::{AnnouncementStore, find_metadata, paths};

/// S3-backed announcement store.
pub struct S3Storage {
    client: Client,
    bucket: String,
    prefix: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    /// Create S3 storage from `S3_BUCKET` and `S3_PREFIX`.
    pub async fn from_env() -> Result<Self> {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let client = Client::new(&config);

        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| AppError::config("S3_BUCKET is not set"))?;
        let prefix = std::env::var("S3_PREFIX").unwrap_or_default();

        Ok(Self::new(client, bucket, prefix))
    }

    fn key(&self, key: &str) -> String {
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}/{key}")
        }
    }

    /// Read an object by its full key, returning None if it doesn't exist.
    pub async fn read_bytes_optional(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output
                    .body
                    .collect()
                    .await
                    .map_err(|e| AppError::S3(e.to_string()))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::info!("No object at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::S3(service_err.to_string()))
                }
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes_optional(&self.key(key)).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AnnouncementStore for S3Storage {
    async fn load_announcements(&self, date: NaiveDate) -> Result<Vec<AnnouncementRecord>> {
        let key = paths::mailing(date);
        match self.read_json(&key).await? {
            Some(records) => Ok(records),
            None => {
                log::warn!("No mailing at s3://{}/{}", self.bucket, self.key(&key));
                Ok(Vec::new())
            }
        }
    }

    async fn load_metadata(&self, paper_id: &str) -> Result<Option<PaperMetadata>> {
        let rows: Vec<PaperMetadata> = self.read_json(paths::METADATA).await?.unwrap_or_default();
        Ok(find_metadata(rows, paper_id))
    }
}
