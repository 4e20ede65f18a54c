use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Open the catalog database in WAL mode.
///
/// With `create` set, a missing file and its parent directories are created.
/// Without it, a missing file is an error and nothing is written to disk.
pub async fn connect(db_path: &Path, acquire_timeout: Duration, create: bool) -> Result<SqlitePool> {
    if create {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
        .create_if_missing(create)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(acquire_timeout)
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open catalog database: {}", db_path.display()))?;

    Ok(pool)
}
