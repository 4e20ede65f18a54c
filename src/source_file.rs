//! File catalog source.
//!
//! `path` may be a single `.json` / `.jsonl` file or a directory. Directories
//! are walked recursively and filtered with include/exclude globs; files are
//! read in path order so the catalog order is deterministic.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use ecomatch_core::{CatalogRow, CatalogSource};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::config::FileSourceConfig;
use crate::decode;

pub struct FileSource {
    config: FileSourceConfig,
}

impl FileSource {
    pub fn new(config: FileSourceConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl CatalogSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || scan_files(&config))
            .await
            .context("File source task panicked")?
    }
}

/// Read every catalog file under the configured path.
pub fn scan_files(config: &FileSourceConfig) -> Result<Vec<CatalogRow>> {
    let root = &config.path;
    if !root.exists() {
        bail!("File source path does not exist: {}", root.display());
    }

    if root.is_file() {
        return read_catalog_file(root);
    }

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        paths.push(path.to_path_buf());
    }

    // Sort for deterministic ordering
    paths.sort();

    let mut rows = Vec::new();
    for path in &paths {
        rows.extend(read_catalog_file(path)?);
    }
    debug!(root = %root.display(), files = paths.len(), rows = rows.len(), "file catalog read");
    Ok(rows)
}

/// Decode one file; `.jsonl` is JSON Lines, anything else a JSON document.
pub fn read_catalog_file(path: &Path) -> Result<Vec<CatalogRow>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

    let is_json_lines = path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("jsonl"));
    let rows = if is_json_lines {
        decode::rows_from_json_lines(&text)
    } else {
        decode::rows_from_str(&text)
    };
    rows.with_context(|| format!("Failed to decode catalog file: {}", path.display()))
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
