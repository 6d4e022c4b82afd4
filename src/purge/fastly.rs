// src/purge/fastly.rs

//! Fastly surrogate-key purge transport.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{PurgeConfig, PurgeTarget};
use crate::purge::PurgeTransport;
use crate::utils::http::{create_async_client, with_trailing_slash};

const SURROGATE_KEY_HEADER: &str = "Surrogate-Key";
const TOKEN_HEADER: &str = "Fastly-Key";
const SOFT_PURGE_HEADER: &str = "Fastly-Soft-Purge";

/// Purges surrogate keys through the Fastly API, one request per call.
///
/// Fastly caps the keys a single request may carry; wrap this in a
/// [`BatchingTransport`](crate::purge::BatchingTransport) for large sets.
#[derive(Debug, Clone)]
pub struct FastlyTransport {
    client: Client,
    api_base: Url,
    token: String,
}

impl FastlyTransport {
    pub fn new(client: Client, api_base: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client,
            api_base: Url::parse(&with_trailing_slash(api_base))?,
            token: token.into(),
        })
    }

    pub fn from_config(config: &PurgeConfig) -> Result<Self> {
        Self::new(
            create_async_client(config)?,
            &config.api_base,
            config.api_token.clone().unwrap_or_default(),
        )
    }

    fn purge_url(&self, service_id: &str) -> Result<Url> {
        Ok(self.api_base.join(&format!("service/{service_id}/purge"))?)
    }
}

#[async_trait]
impl PurgeTransport for FastlyTransport {
    async fn purge(&self, target: &PurgeTarget, keys: &[String], soft_purge: bool) -> Result<()> {
        if self.token.is_empty() {
            return Err(AppError::config("FASTLY_API_TOKEN is not set"));
        }
        let url = self.purge_url(&target.service_id)?;
        log::debug!("POST {} ({} keys, soft: {})", url, keys.len(), soft_purge);

        let mut request = self
            .client
            .post(url)
            .header(TOKEN_HEADER, &self.token)
            .header(SURROGATE_KEY_HEADER, keys.join(" "));
        if soft_purge {
            request = request.header(SOFT_PURGE_HEADER, "1");
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::purge(&target.domain, None, e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(AppError::purge(&target.domain, Some(status.as_u16()), body.trim()))
    }
}
