//! Catalog source abstraction.
//!
//! A [`CatalogSource`] supplies the raw [`CatalogRow`]s the engine indexes.
//! The transport (SQL query, file read, HTTP listing) is irrelevant to the
//! engine as long as every row satisfies the `CatalogRow` shape.
//!
//! Implementations must be `Send + Sync`; the engine holds one behind an
//! `Arc` and calls [`fetch`](CatalogSource::fetch) on every refresh.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::CatalogRow;

/// Pluggable provider of catalog rows.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`name`](CatalogSource::name) | Label used in logs and refresh reports |
/// | [`fetch`](CatalogSource::fetch) | Bulk-load every row |
#[async_trait]
pub trait CatalogSource: Send + Sync {
    fn name(&self) -> &str;

    /// Load the whole catalog. Called once per refresh, never retried.
    async fn fetch(&self) -> Result<Vec<CatalogRow>>;
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for std::sync::Arc<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        (**self).fetch().await
    }
}

#[async_trait]
impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        (**self).fetch().await
    }
}
