//! Load a JSON / JSON Lines catalog file into the SQLite `eco_products` table.
//!
//! Rows are upserted by `id` in one transaction. With `--replace` the table
//! is cleared first, so the database mirrors the file exactly.

use anyhow::{bail, Result};
use ecomatch_core::CatalogRow;
use sqlx::SqlitePool;
use std::path::Path;

use crate::config::Config;
use crate::db;
use crate::migrate;
use crate::source_file;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub read: usize,
    pub upserted: usize,
    pub removed: u64,
}

pub async fn run_import(config: &Config, file: &Path, replace: bool, dry_run: bool) -> Result<()> {
    if !file.exists() {
        bail!("Import file does not exist: {}", file.display());
    }
    let rows = source_file::read_catalog_file(file)?;

    if dry_run {
        println!("import {} (dry-run)", file.display());
        println!("  rows found: {}", rows.len());
        return Ok(());
    }

    let pool = db::connect(config.sqlite_path()?, config.source.timeout(), true).await?;
    migrate::migrate(&pool).await?;
    let stats = import_rows(&pool, &rows, replace).await?;
    pool.close().await;

    println!("import {}", file.display());
    println!("  rows read: {}", stats.read);
    println!("  upserted: {}", stats.upserted);
    if replace {
        println!("  removed: {}", stats.removed);
    }
    println!("ok");
    Ok(())
}

/// Upsert `rows` into `eco_products`, optionally clearing the table first.
pub async fn import_rows(pool: &SqlitePool, rows: &[CatalogRow], replace: bool) -> Result<ImportStats> {
    let now = chrono::Utc::now().timestamp();
    let mut stats = ImportStats {
        read: rows.len(),
        ..Default::default()
    };

    let mut tx = pool.begin().await?;

    if replace {
        stats.removed = sqlx::query("DELETE FROM eco_products")
            .execute(&mut *tx)
            .await?
            .rows_affected();
    }

    for row in rows {
        sqlx::query(
            r#"
            INSERT INTO eco_products (id, name, category, material, size, type, carbon_emission, durability_score, price, description, brand, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                material = excluded.material,
                size = excluded.size,
                type = excluded.type,
                carbon_emission = excluded.carbon_emission,
                durability_score = excluded.durability_score,
                price = excluded.price,
                description = excluded.description,
                brand = excluded.brand,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.category)
        .bind(&row.material)
        .bind(&row.size)
        .bind(&row.product_type)
        .bind(row.carbon_emission)
        .bind(row.durability_score)
        .bind(row.price)
        .bind(&row.description)
        .bind(&row.brand)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        stats.upserted += 1;
    }

    tx.commit().await?;
    Ok(stats)
}
