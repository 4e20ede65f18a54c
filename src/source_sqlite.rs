//! SQLite catalog source.
//!
//! Reads every row of the `eco_products` table. Columns are mapped by name
//! onto [`CatalogRow`], so legacy column names (`cradle_to_warehouse_footprint`,
//! `category_name`, `eco_points`) are accepted the same way JSON keys are.
//! SQLite storage classes are preserved: a footprint stored as the text
//! `"2.5"` is parsed, a blank one becomes a data issue downstream.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ecomatch_core::{CatalogRow, CatalogSource};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::db;

pub const PRODUCTS_TABLE: &str = "eco_products";

pub struct SqliteSource {
    path: PathBuf,
    acquire_timeout: Duration,
}

impl SqliteSource {
    pub fn new(path: PathBuf, acquire_timeout: Duration) -> Self {
        Self {
            path,
            acquire_timeout,
        }
    }
}

#[async_trait]
impl CatalogSource for SqliteSource {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        let pool = db::connect(&self.path, self.acquire_timeout, false).await?;

        let sql = format!("SELECT * FROM {} ORDER BY id", PRODUCTS_TABLE);
        let db_rows = sqlx::query(&sql)
            .fetch_all(&pool)
            .await
            .with_context(|| format!("Failed to read {} from {}", PRODUCTS_TABLE, self.path.display()))?;
        pool.close().await;

        let mut rows = Vec::with_capacity(db_rows.len());
        for (index, db_row) in db_rows.iter().enumerate() {
            let value = row_to_json(db_row)?;
            match serde_json::from_value::<CatalogRow>(value) {
                Ok(row) => rows.push(row),
                Err(e) => warn!(index, error = %e, "skipping malformed catalog row"),
            }
        }

        debug!(path = %self.path.display(), rows = rows.len(), "sqlite catalog read");
        Ok(rows)
    }
}

/// One result row as a JSON object keyed by column name.
fn row_to_json(row: &SqliteRow) -> Result<Value> {
    let mut map = Map::new();
    for column in row.columns() {
        let i = column.ordinal();
        let (is_null, type_name) = {
            let raw = row.try_get_raw(i)?;
            (raw.is_null(), raw.type_info().name().to_string())
        };

        let value = if is_null {
            Value::Null
        } else {
            match type_name.as_str() {
                "INTEGER" => Value::from(row.try_get_unchecked::<i64, _>(i)?),
                "REAL" => serde_json::Number::from_f64(row.try_get_unchecked::<f64, _>(i)?)
                    .map(Value::Number)
                    .unwrap_or(Value::Null),
                "TEXT" => Value::String(row.try_get_unchecked::<String, _>(i)?),
                _ => Value::Null,
            }
        };
        map.insert(column.name().to_string(), value);
    }
    Ok(Value::Object(map))
}
