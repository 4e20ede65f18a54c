//! Fetch deadline for any [`CatalogSource`].

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use ecomatch_core::{CatalogRow, CatalogSource};
use std::time::Duration;

/// Wraps a source so a fetch that outlives `timeout` fails instead of
/// blocking the refresh.
pub struct TimeoutSource<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutSource<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<S: CatalogSource> CatalogSource for TimeoutSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        match tokio::time::timeout(self.timeout, self.inner.fetch()).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!(
                "catalog fetch from '{}' timed out after {:?}",
                self.inner.name(),
                self.timeout
            )),
        }
    }
}
