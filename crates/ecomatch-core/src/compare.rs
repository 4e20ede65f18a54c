//! Direct two-product comparison.

use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::error::FailureKind;
use crate::matcher::Matcher;
use crate::models::{EcoType, ProductRecord};
use crate::query::ParsedQuery;
use crate::recommend::{highest_emission, lowest_emission, RecommendationResult};

pub const MSG_NOT_FOUND: &str = "One or both products not found.";
pub const MSG_NO_VARIANTS: &str = "Could not find both eco and non-eco variants in this category.";

/// Resolves two product names against one snapshot and picks the greener.
pub struct ComparisonResolver<'a> {
    index: &'a CatalogIndex,
    matcher: &'a Matcher,
}

impl<'a> ComparisonResolver<'a> {
    pub fn new(index: &'a CatalogIndex, matcher: &'a Matcher) -> Self {
        Self { index, matcher }
    }

    pub fn compare(&self, name_a: &str, name_b: &str) -> RecommendationResult {
        self.compare_parsed(name_a, name_b, ParsedQuery::for_comparison(name_a, name_b))
    }

    /// Like [`compare`](Self::compare), echoing an existing parse.
    pub fn compare_parsed(&self, name_a: &str, name_b: &str, parsed: ParsedQuery) -> RecommendationResult {
        let (a, b) = match (self.resolve(name_a), self.resolve(name_b)) {
            (Some(a), Some(b)) => (a, b),
            _ => return RecommendationResult::failure(FailureKind::NotFound, MSG_NOT_FOUND, parsed),
        };

        if a.id() == b.id() {
            return self.compare_variants(a, parsed);
        }

        // equal footprints keep the first-named product as the better one
        if b.carbon_emission() < a.carbon_emission() {
            RecommendationResult::success(b, a, parsed)
        } else {
            RecommendationResult::success(a, b, parsed)
        }
    }

    /// Both names hit the same product: best eco vs worst non-eco in its category.
    fn compare_variants(&self, product: &ProductRecord, parsed: ParsedQuery) -> RecommendationResult {
        let category = product.category_norm();
        debug!(product = product.name(), category, "same product named twice");

        let eco = self.index.by_category(category, EcoType::Eco);
        let non_eco = self.index.by_category(category, EcoType::NonEco);
        match (lowest_emission(&eco), highest_emission(&non_eco)) {
            (Some(best), Some(worst)) => RecommendationResult::success(best, worst, parsed),
            _ => RecommendationResult::failure(FailureKind::NotFound, MSG_NO_VARIANTS, parsed),
        }
    }

    /// Exact (or case/punctuation-insensitive) name first, then the
    /// two-stage matcher over normalized names.
    fn resolve(&self, name: &str) -> Option<&'a ProductRecord> {
        if let Some(product) = self.index.by_name(name) {
            return Some(product);
        }
        let threshold = self.matcher.policy().name_threshold;
        let hit = self.matcher.find(name, self.index.names_norm(), threshold)?;
        self.index.products().get(hit.index)
    }
}
