//! In-memory [`CatalogSource`] for tests and embedding.
//!
//! Rows live behind a `std::sync::RwLock`, so a test can swap the catalog
//! or simulate an outage between refreshes.

use std::sync::RwLock;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::CatalogRow;

use super::CatalogSource;

struct State {
    rows: Vec<CatalogRow>,
    unavailable: bool,
}

/// Catalog held in memory.
pub struct InMemorySource {
    name: String,
    state: RwLock<State>,
}

impl InMemorySource {
    pub fn new(rows: Vec<CatalogRow>) -> Self {
        Self::named("memory", rows)
    }

    pub fn named(name: &str, rows: Vec<CatalogRow>) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(State {
                rows,
                unavailable: false,
            }),
        }
    }

    /// Replace the rows returned by the next fetch.
    pub fn set_rows(&self, rows: Vec<CatalogRow>) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.rows = rows;
    }

    /// Make fetches fail until called again with `false`.
    pub fn set_unavailable(&self, unavailable: bool) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        state.unavailable = unavailable;
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CatalogSource for InMemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        let state = self
            .state
            .read()
            .map_err(|_| anyhow!("in-memory catalog lock poisoned"))?;
        if state.unavailable {
            bail!("in-memory catalog '{}' is unavailable", self.name);
        }
        Ok(state.rows.clone())
    }
}
