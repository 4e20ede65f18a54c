//! Core data models used throughout EcoMatch.
//!
//! [`CatalogRow`] is the raw record shape every catalog source produces.
//! [`ProductRecord`] is the indexed form with derived normalized fields,
//! and [`ProductView`] is the serializable projection handed to callers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::normalize::normalize;

/// Eco classification of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EcoType {
    #[serde(rename = "eco")]
    Eco,
    #[serde(rename = "non-eco")]
    NonEco,
}

impl EcoType {
    /// Parse an explicit type column. Returns `None` for anything that is
    /// not recognisably eco or non-eco, so the caller can infer instead.
    pub fn parse(raw: &str) -> Option<Self> {
        match normalize(raw).replace(' ', "").as_str() {
            "eco" | "ecofriendly" | "green" => Some(EcoType::Eco),
            "noneco" | "nonecofriendly" | "conventional" => Some(EcoType::NonEco),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EcoType::Eco => "eco",
            EcoType::NonEco => "non-eco",
        }
    }
}

impl std::fmt::Display for EcoType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size bucket recognised in queries and inferred for unsized products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw catalog row as supplied by a [`CatalogSource`](crate::source::CatalogSource).
///
/// Only `id`, `name` and `category` are required. The footprint field is
/// read leniently: numbers, numeric strings, `null` and garbage are all
/// accepted, the last two becoming `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogRow {
    pub id: i64,
    pub name: String,
    #[serde(alias = "category_name")]
    pub category: String,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default, rename = "type", alias = "product_type")]
    pub product_type: Option<String>,
    #[serde(
        default,
        alias = "cradle_to_warehouse_footprint",
        alias = "footprint",
        deserialize_with = "lenient_f64"
    )]
    pub carbon_emission: Option<f64>,
    #[serde(default, alias = "eco_points", deserialize_with = "lenient_i64")]
    pub durability_score: Option<i64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
}

impl CatalogRow {
    /// Minimal row; the remaining fields take their absent defaults.
    pub fn new(id: i64, name: &str, category: &str, carbon_emission: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            category: category.to_string(),
            carbon_emission: Some(carbon_emission),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, product_type: &str) -> Self {
        self.product_type = Some(product_type.to_string());
        self
    }

    pub fn with_size(mut self, size: &str) -> Self {
        self.size = Some(size.to_string());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
    .filter(|f| f.is_finite()))
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

/// Derived fields, always computed from the owning record.
#[derive(Debug, Clone, PartialEq)]
struct NormalizedFields {
    category: String,
    size: String,
    eco_type: String,
    name: String,
    description: String,
}

/// An indexed product.
///
/// Built only through [`ProductRecord::new`], which computes the
/// normalized fields. The fields are read-only so the derived values
/// can never drift from the source values.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    id: i64,
    name: String,
    category: String,
    material: Option<String>,
    size: String,
    eco_type: EcoType,
    carbon_emission: f64,
    durability_score: Option<i64>,
    price: Option<f64>,
    description: String,
    brand: Option<String>,
    norm: NormalizedFields,
}

/// Resolved values for a record, after defaults and inference.
#[derive(Debug, Clone)]
pub struct ProductFields {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub material: Option<String>,
    pub size: String,
    pub eco_type: EcoType,
    pub carbon_emission: f64,
    pub durability_score: Option<i64>,
    pub price: Option<f64>,
    pub description: String,
    pub brand: Option<String>,
}

impl ProductRecord {
    pub fn new(fields: ProductFields) -> Self {
        let norm = NormalizedFields {
            category: normalize(&fields.category),
            size: normalize(&fields.size),
            eco_type: fields.eco_type.as_str().to_string(),
            name: normalize(&fields.name),
            description: normalize(&fields.description),
        };
        Self {
            id: fields.id,
            name: fields.name,
            category: fields.category,
            material: fields.material,
            size: fields.size,
            eco_type: fields.eco_type,
            carbon_emission: fields.carbon_emission.max(0.0),
            durability_score: fields.durability_score,
            price: fields.price,
            description: fields.description,
            brand: fields.brand,
            norm,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn category(&self) -> &str {
        &self.category
    }
    pub fn size(&self) -> &str {
        &self.size
    }
    pub fn eco_type(&self) -> EcoType {
        self.eco_type
    }
    pub fn is_eco(&self) -> bool {
        self.eco_type == EcoType::Eco
    }
    pub fn carbon_emission(&self) -> f64 {
        self.carbon_emission
    }
    pub fn price(&self) -> Option<f64> {
        self.price
    }

    pub fn category_norm(&self) -> &str {
        &self.norm.category
    }
    pub fn size_norm(&self) -> &str {
        &self.norm.size
    }
    pub fn type_norm(&self) -> &str {
        &self.norm.eco_type
    }
    pub fn name_norm(&self) -> &str {
        &self.norm.name
    }
    pub fn description_norm(&self) -> &str {
        &self.norm.description
    }

    /// Public projection of this record.
    pub fn view(&self) -> ProductView {
        ProductView {
            id: self.id,
            name: self.name.clone(),
            category: self.category.clone(),
            material: self.material.clone(),
            size: self.size.clone(),
            product_type: self.eco_type,
            carbon_emission: self.carbon_emission,
            durability_score: self.durability_score,
            price: self.price,
            description: self.description.clone(),
            brand: self.brand.clone(),
        }
    }
}

/// Product as returned in a [`RecommendationResult`](crate::recommend::RecommendationResult).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductView {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub material: Option<String>,
    pub size: String,
    #[serde(rename = "type")]
    pub product_type: EcoType,
    pub carbon_emission: f64,
    pub durability_score: Option<i64>,
    pub price: Option<f64>,
    pub description: String,
    pub brand: Option<String>,
}
