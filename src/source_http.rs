//! HTTP catalog source.
//!
//! Issues one `GET` against a product listing endpoint and decodes the body
//! with [`decode::rows_from_value`](crate::decode::rows_from_value): a bare
//! array, or an object carrying the array under `items`, `content`, `data`,
//! `results` or `products`.
//!
//! # Configuration
//!
//! ```toml
//! [source.http]
//! url = "http://localhost:9091/api/v1/products"
//! token_env = "ECOMATCH_API_TOKEN"   # optional bearer token
//! ```
//!
//! The client carries the `[source].timeout_secs` timeout. Non-2xx responses
//! are errors; there is no retry.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use ecomatch_core::{CatalogRow, CatalogSource};
use std::time::Duration;
use tracing::debug;

use crate::config::HttpSourceConfig;
use crate::decode;

pub struct HttpSource {
    config: HttpSourceConfig,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(config: HttpSourceConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    fn bearer_token(&self) -> Result<Option<String>> {
        match &self.config.token_env {
            Some(var) => std::env::var(var)
                .map(Some)
                .with_context(|| format!("Environment variable {} is not set", var)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CatalogSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        let mut request = self
            .client
            .get(&self.config.url)
            .header("Accept", "application/json");
        if let Some(token) = self.bearer_token()? {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("Catalog request to {} failed", self.config.url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body_text = resp.text().await.unwrap_or_default();
            bail!("Catalog listing error {}: {}", status, body_text);
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .context("Catalog listing is not valid JSON")?;
        let rows = decode::rows_from_value(json)?;

        debug!(url = %self.config.url, rows = rows.len(), "http catalog read");
        Ok(rows)
    }
}
