//! Immutable, query-ready catalog snapshot.
//!
//! [`CatalogIndex::build`] runs every raw [`CatalogRow`] through one
//! pipeline: defaults for missing fields, size inference, adaptive eco
//! classification, and normalization. The result is never mutated; a
//! refresh builds a new index and swaps it in whole.
//!
//! # Eco Classification
//!
//! Rows with an explicit, recognisable `type` keep it. All other rows are
//! classified against an adaptive threshold:
//!
//! ```text
//! threshold = max(lower_median(carbon_emission) × multiplier, min_threshold)
//! carbon_emission > threshold  ⇒  non-eco, else eco
//! ```
//!
//! The median runs over every row in the catalog, after defaults.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::FailureKind;
use crate::models::{CatalogRow, EcoType, ProductFields, ProductRecord, Size};
use crate::normalize::normalize;
use crate::rules::KeywordRules;

static LARGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(xl|xxl|large|big|giant|6 ?piece|12 ?litre|12l|25-piece)\b")
        .expect("large size pattern is valid")
});

static SMALL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(small|mini|pack of 2|pack of 3|single|1pc|1 pack)\b")
        .expect("small size pattern is valid")
});

/// Tunable eco/non-eco threshold policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationPolicy {
    /// Factor applied to the median footprint.
    pub multiplier: f64,
    /// Floor for the threshold, so an all-zero catalog still classifies.
    pub min_threshold: f64,
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            multiplier: 1.5,
            min_threshold: 0.1,
        }
    }
}

impl ClassificationPolicy {
    /// Threshold for the given footprints.
    pub fn threshold(&self, emissions: &[f64]) -> f64 {
        let median = lower_median(emissions).unwrap_or(0.0);
        (median * self.multiplier).max(self.min_threshold)
    }

    pub fn classify(&self, carbon_emission: f64, threshold: f64) -> EcoType {
        if carbon_emission > threshold {
            EcoType::NonEco
        } else {
            EcoType::Eco
        }
    }
}

/// Lower median: element `(n - 1) / 2` of the sorted values.
pub fn lower_median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Some(sorted[(sorted.len() - 1) / 2])
}

/// Size heuristic over a product's name and description.
pub fn infer_size(name: &str, description: &str) -> Size {
    let text = format!("{} {}", name, description).to_lowercase();
    if LARGE_PATTERN.is_match(&text) {
        Size::Large
    } else if SMALL_PATTERN.is_match(&text) {
        Size::Small
    } else {
        Size::Medium
    }
}

/// A field that was missing or unusable and got a substituted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataIssue {
    pub kind: FailureKind,
    pub product_id: i64,
    pub field: &'static str,
    pub detail: String,
}

impl DataIssue {
    fn partial(product_id: i64, field: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::PartialData,
            product_id,
            field,
            detail: detail.into(),
        }
    }
}

/// Immutable snapshot of the normalized, classified catalog.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    products: Vec<ProductRecord>,
    names_norm: Vec<String>,
    categories: Vec<String>,
    rules: KeywordRules,
    threshold: Option<f64>,
    issues: Vec<DataIssue>,
    digest: String,
    built_at: DateTime<Utc>,
}

impl CatalogIndex {
    /// Build an index from raw rows. Never fails: missing fields get
    /// defaults and are recorded as [`DataIssue`]s.
    pub fn build(rows: Vec<CatalogRow>, policy: &ClassificationPolicy) -> Self {
        let digest = catalog_digest(&rows);
        let mut issues = Vec::new();
        let mut seen_ids = HashSet::new();

        let mut unique_rows = Vec::with_capacity(rows.len());
        for row in rows {
            if !seen_ids.insert(row.id) {
                issues.push(DataIssue::partial(
                    row.id,
                    "id",
                    format!("duplicate id, dropped '{}'", row.name),
                ));
                continue;
            }
            unique_rows.push(row);
        }

        let emissions: Vec<f64> = unique_rows
            .iter()
            .map(|r| r.carbon_emission.unwrap_or(0.0).max(0.0))
            .collect();

        let needs_inference = unique_rows.iter().any(|r| {
            r.product_type
                .as_deref()
                .and_then(EcoType::parse)
                .is_none()
        });
        let threshold = needs_inference.then(|| policy.threshold(&emissions));

        let mut products = Vec::with_capacity(unique_rows.len());
        for (row, carbon_emission) in unique_rows.into_iter().zip(emissions) {
            if row.carbon_emission.is_none() {
                issues.push(DataIssue::partial(
                    row.id,
                    "carbon_emission",
                    "missing or unparseable, defaulted to 0.0",
                ));
            }

            let eco_type = match row.product_type.as_deref().and_then(EcoType::parse) {
                Some(t) => t,
                None => {
                    // `threshold` is always set when any row lacks a type.
                    let t = policy.classify(carbon_emission, threshold.unwrap_or(policy.min_threshold));
                    issues.push(DataIssue::partial(
                        row.id,
                        "type",
                        format!("inferred as {}", t),
                    ));
                    t
                }
            };

            let description = row.description.unwrap_or_default();
            let size = match row.size.filter(|s| !s.trim().is_empty()) {
                Some(s) => s,
                None => {
                    let inferred = infer_size(&row.name, &description);
                    issues.push(DataIssue::partial(
                        row.id,
                        "size",
                        format!("inferred as {}", inferred),
                    ));
                    inferred.as_str().to_string()
                }
            };

            products.push(ProductRecord::new(ProductFields {
                id: row.id,
                name: row.name,
                category: row.category,
                material: row.material,
                size,
                eco_type,
                carbon_emission,
                durability_score: row.durability_score,
                price: row.price,
                description,
                brand: row.brand,
            }));
        }

        let names_norm = products.iter().map(|p| p.name_norm().to_string()).collect();

        let mut categories: Vec<String> = Vec::new();
        for p in &products {
            if !p.category_norm().is_empty() && !categories.iter().any(|c| c == p.category_norm()) {
                categories.push(p.category_norm().to_string());
            }
        }

        let rules = KeywordRules::with_vocabulary(categories.as_slice());

        let index = Self {
            products,
            names_norm,
            categories,
            rules,
            threshold,
            issues,
            digest,
            built_at: Utc::now(),
        };

        if !index.issues.is_empty() {
            warn!(
                issues = index.issues.len(),
                "catalog built with substituted defaults"
            );
        }
        info!(
            products = index.products.len(),
            eco = index.eco_count(),
            non_eco = index.non_eco_count(),
            threshold = ?index.threshold,
            "catalog index built"
        );

        index
    }

    /// Index with no products.
    pub fn empty() -> Self {
        Self::build(Vec::new(), &ClassificationPolicy::default())
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct normalized categories, in catalog order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Keyword table: static synonyms plus this catalog's categories.
    pub fn keyword_rules(&self) -> &KeywordRules {
        &self.rules
    }

    /// Normalized product names, parallel to [`products`](Self::products).
    pub fn names_norm(&self) -> &[String] {
        &self.names_norm
    }

    /// Adaptive threshold used for rows without an explicit type.
    pub fn threshold(&self) -> Option<f64> {
        self.threshold
    }

    pub fn issues(&self) -> &[DataIssue] {
        &self.issues
    }

    /// SHA-256 over the raw rows this index was built from.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    pub fn eco_count(&self) -> usize {
        self.products.iter().filter(|p| p.is_eco()).count()
    }

    pub fn non_eco_count(&self) -> usize {
        self.products.len() - self.eco_count()
    }

    /// Products whose normalized category contains `category`, of the given
    /// type, optionally restricted to an exact normalized size.
    pub fn by_category_and_size(
        &self,
        category: &str,
        size: Option<&str>,
        eco_type: EcoType,
    ) -> Vec<&ProductRecord> {
        let category = normalize(category);
        let size = size.map(normalize);
        self.products
            .iter()
            .filter(|p| p.eco_type() == eco_type && p.category_norm().contains(&category))
            .filter(|p| size.as_deref().map_or(true, |s| p.size_norm() == s))
            .collect()
    }

    /// Products whose normalized category equals `category`, of the given type.
    pub fn by_category(&self, category: &str, eco_type: EcoType) -> Vec<&ProductRecord> {
        let category = normalize(category);
        self.products
            .iter()
            .filter(|p| p.eco_type() == eco_type && p.category_norm() == category)
            .collect()
    }

    /// Lookup by name: exact first, then case-insensitive, then normalized.
    pub fn by_name(&self, name: &str) -> Option<&ProductRecord> {
        let trimmed = name.trim();
        if let Some(p) = self.products.iter().find(|p| p.name() == trimmed) {
            return Some(p);
        }
        let lower = trimmed.to_lowercase();
        if let Some(p) = self.products.iter().find(|p| p.name().to_lowercase() == lower) {
            return Some(p);
        }
        let norm = normalize(trimmed);
        if norm.is_empty() {
            return None;
        }
        self.products.iter().find(|p| p.name_norm() == norm)
    }
}

fn catalog_digest(rows: &[CatalogRow]) -> String {
    let mut hasher = Sha256::new();
    for row in rows {
        if let Ok(bytes) = serde_json::to_vec(row) {
            hasher.update(&bytes);
        }
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}
