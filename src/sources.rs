//! Catalog source selection from configuration.

use anyhow::{anyhow, Result};
use ecomatch_core::CatalogSource;

use crate::config::{Config, SourceKind};
use crate::source_file::FileSource;
use crate::source_http::HttpSource;
use crate::source_sqlite::SqliteSource;
use crate::timeout::TimeoutSource;

/// The configured source, wrapped in the fetch timeout.
pub type ConfiguredSource = TimeoutSource<Box<dyn CatalogSource>>;

pub fn build_source(config: &Config) -> Result<ConfiguredSource> {
    let timeout = config.source.timeout();
    let missing = |kind: SourceKind| anyhow!("[source.{}] is not configured", kind.as_str());

    let inner: Box<dyn CatalogSource> = match config.source.kind {
        SourceKind::Sqlite => {
            let sqlite = config.source.sqlite.as_ref().ok_or_else(|| missing(SourceKind::Sqlite))?;
            Box::new(SqliteSource::new(sqlite.path.clone(), timeout))
        }
        SourceKind::File => {
            let file = config.source.file.as_ref().ok_or_else(|| missing(SourceKind::File))?;
            Box::new(FileSource::new(file.clone()))
        }
        SourceKind::Http => {
            let http = config.source.http.as_ref().ok_or_else(|| missing(SourceKind::Http))?;
            Box::new(HttpSource::new(http.clone(), timeout)?)
        }
    };

    Ok(TimeoutSource::new(inner, timeout))
}

/// Print every source section and whether it is usable.
pub fn list_sources(config: &Config) -> Result<()> {
    let selected = config.source.kind;

    let sqlite_status = match &config.source.sqlite {
        Some(s) if s.path.exists() => "OK",
        Some(_) => "NOT INITIALIZED (run `ecomatch init`)",
        None => "NOT CONFIGURED",
    };
    let file_status = match &config.source.file {
        Some(f) if f.path.exists() => "OK",
        Some(_) => "NOT FOUND",
        None => "NOT CONFIGURED",
    };
    let http_status = match &config.source.http {
        Some(_) => "CONFIGURED",
        None => "NOT CONFIGURED",
    };

    println!("{:<10} {:<10} STATUS", "SOURCE", "SELECTED");
    for (kind, status) in [
        (SourceKind::Sqlite, sqlite_status),
        (SourceKind::File, file_status),
        (SourceKind::Http, http_status),
    ] {
        let mark = if kind == selected { "*" } else { "" };
        println!("{:<10} {:<10} {}", kind.as_str(), mark, status);
    }
    println!();
    println!("Fetch timeout: {}s", config.source.timeout_secs);

    Ok(())
}
