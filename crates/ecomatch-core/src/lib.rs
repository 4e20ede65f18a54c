//! # EcoMatch Core
//!
//! Shared, WASM-safe logic for EcoMatch: catalog models, text
//! normalization, two-stage fuzzy/semantic matching, query parsing, and the
//! eco recommendation and comparison pipelines.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or other
//! native-only dependencies. Catalog data arrives through the
//! [`source::CatalogSource`] trait, which the application crate implements
//! for SQLite, files, and HTTP listings.
//!
//! ## Pipeline
//!
//! ```text
//! raw text ──▶ QueryParser ──▶ candidate sets ──▶ recommend / compare ──▶ RecommendationResult
//!                  │                                   ▲
//!                  └────── Matcher ◀─── CatalogIndex ──┘
//! ```

pub mod catalog;
pub mod compare;
pub mod engine;
pub mod error;
pub mod matcher;
pub mod models;
pub mod normalize;
pub mod query;
pub mod recommend;
pub mod rules;
pub mod source;

pub use catalog::{CatalogIndex, ClassificationPolicy};
pub use engine::{EngineSettings, Recommender, RefreshReport};
pub use error::{EngineError, FailureKind};
pub use matcher::{MatchPolicy, Matcher};
pub use models::{CatalogRow, EcoType, ProductRecord, ProductView, Size};
pub use query::ParsedQuery;
pub use recommend::RecommendationResult;
pub use source::CatalogSource;
