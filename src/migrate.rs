use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

/// Create the catalog schema in the configured SQLite database.
pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config.sqlite_path()?, config.source.timeout(), true).await?;
    migrate(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Idempotent schema setup on an open pool.
pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    // Numeric columns have no declared type, so imported numeric strings and
    // blanks are stored as-is and parsed leniently on read.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS eco_products (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            material TEXT,
            size TEXT,
            type TEXT,
            carbon_emission,
            durability_score,
            price,
            description TEXT,
            brand TEXT,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_eco_products_category ON eco_products(category)")
        .execute(pool)
        .await?;

    Ok(())
}
