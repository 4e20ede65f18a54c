//! JSON payload decoding shared by the file source, the HTTP source and
//! `import`.
//!
//! Accepted shapes:
//!
//! | Shape | Example |
//! |-------|---------|
//! | Bare array | `[{"id": 1, ...}, ...]` |
//! | Listing wrapper | `{"content": [...], "totalPages": 3}` |
//! | JSON Lines | one object per line |
//!
//! Malformed elements are skipped with a warning instead of failing the
//! whole payload.

use anyhow::{bail, Context, Result};
use ecomatch_core::CatalogRow;
use serde_json::Value;
use tracing::warn;

/// Object keys searched, in order, for the product array of a listing.
pub const LISTING_KEYS: &[&str] = &["items", "content", "data", "results", "products"];

/// Decode a JSON document (array or listing wrapper).
pub fn rows_from_str(text: &str) -> Result<Vec<CatalogRow>> {
    let value: Value = serde_json::from_str(text).context("Invalid JSON catalog payload")?;
    rows_from_value(value)
}

pub fn rows_from_value(value: Value) -> Result<Vec<CatalogRow>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            let key = LISTING_KEYS
                .iter()
                .find(|k| map.get(**k).map_or(false, Value::is_array));
            match key.and_then(|k| map.remove(*k)) {
                Some(Value::Array(items)) => items,
                _ => bail!(
                    "expected a JSON array of products or an object with one of: {}",
                    LISTING_KEYS.join(", ")
                ),
            }
        }
        _ => bail!("expected a JSON array or object, got a scalar"),
    };
    Ok(decode_items(items))
}

/// Decode JSON Lines; blank lines are ignored.
pub fn rows_from_json_lines(text: &str) -> Result<Vec<CatalogRow>> {
    let mut items = Vec::new();
    for (n, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value =
            serde_json::from_str(line).with_context(|| format!("Invalid JSON on line {}", n + 1))?;
        items.push(value);
    }
    Ok(decode_items(items))
}

fn decode_items(items: Vec<Value>) -> Vec<CatalogRow> {
    let mut rows = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<CatalogRow>(item) {
            Ok(row) => rows.push(row),
            Err(e) => warn!(index, error = %e, "skipping malformed catalog row"),
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_bare_array() {
        let rows = rows_from_str(
            r#"[{"id": 1, "name": "Steel Bottle", "category": "drinkware", "carbon_emission": "2.5"}]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].carbon_emission, Some(2.5));
    }

    #[test]
    fn decodes_listing_wrapper_with_aliases() {
        let rows = rows_from_str(
            r#"{"totalPages": 1, "content": [
                {"id": 7, "name": "Jute Bag", "category_name": "shopping bag",
                 "cradle_to_warehouse_footprint": 0.4, "eco_points": 80}
            ]}"#,
        )
        .unwrap();
        assert_eq!(rows[0].category, "shopping bag");
        assert_eq!(rows[0].carbon_emission, Some(0.4));
        assert_eq!(rows[0].durability_score, Some(80));
    }

    #[test]
    fn skips_malformed_rows() {
        let rows = rows_from_str(
            r#"[{"id": 1, "name": "Cup", "category": "drinkware"}, {"name": "no id"}, 42]"#,
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].carbon_emission, None);
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(rows_from_str(r#"{"page": 1}"#).is_err());
        assert!(rows_from_str("7").is_err());
        assert!(rows_from_str("not json").is_err());
    }

    #[test]
    fn decodes_json_lines() {
        let text = "{\"id\": 1, \"name\": \"A\", \"category\": \"kitchen\"}\n\n{\"id\": 2, \"name\": \"B\", \"category\": \"kitchen\"}\n";
        let rows = rows_from_json_lines(text).unwrap();
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);

        let err = rows_from_json_lines("{\"id\": 1}\n{oops").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
