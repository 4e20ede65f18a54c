//! Eco recommendation pipeline.
//!
//! # Pipeline
//!
//! ```text
//! ParseQuery → ResolveCandidates → Classify → SelectWinner → BuildResponse
//! ```
//!
//! 1. Parse the text. Compare intent is handed to
//!    [`ComparisonResolver`](crate::compare::ComparisonResolver).
//! 2. No category ⇒ `AmbiguousInput`.
//! 3. Eco set A and non-eco set B: category substring match, plus size.
//! 4. A empty ⇒ one retry: semantic match of the category against the
//!    catalog's category vocabulary, then exact category match (no size).
//! 5. A or B still empty ⇒ `NotFound`.
//! 6. Winner = min footprint in A, reference = max footprint in B. Ties
//!    keep catalog order.
//! 7. Reason names both products and both footprints.

use serde::Serialize;
use tracing::debug;

use crate::catalog::CatalogIndex;
use crate::compare::ComparisonResolver;
use crate::error::FailureKind;
use crate::matcher::Matcher;
use crate::models::{EcoType, ProductRecord, ProductView};
use crate::query::{ParsedQuery, QueryParser};

pub const MSG_NO_PRODUCT: &str = "No product detected in your request.";
pub const MSG_NO_ECO_ALTERNATIVE: &str = "No eco alternative found for this category.";
pub const MSG_SOURCE_UNAVAILABLE: &str = "Product catalog is currently unavailable.";

/// Outcome of `recommend` or `compare`.
///
/// Serializes as `{success, recommended?, reason?, message?, kind?,
/// compared_with?, parsed?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
    /// The product the recommendation was weighed against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compared_with: Option<ProductView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedQuery>,
}

impl RecommendationResult {
    /// `better` is recommended over `worse`.
    pub fn success(better: &ProductRecord, worse: &ProductRecord, parsed: ParsedQuery) -> Self {
        Self {
            success: true,
            recommended: Some(better.view()),
            reason: Some(reason(better, worse)),
            message: None,
            kind: None,
            compared_with: Some(worse.view()),
            parsed: Some(parsed),
        }
    }

    pub fn failure(kind: FailureKind, message: &str, parsed: ParsedQuery) -> Self {
        Self {
            success: false,
            recommended: None,
            reason: None,
            message: Some(message.to_string()),
            kind: Some(kind),
            compared_with: None,
            parsed: Some(parsed),
        }
    }
}

/// "`better` is more eco-friendly with X kg CO₂e compared to `worse` (Y kg CO₂e)."
pub fn reason(better: &ProductRecord, worse: &ProductRecord) -> String {
    format!(
        "{} is more eco-friendly with {} kg CO₂e compared to {} ({} kg CO₂e).",
        better.name(),
        format_kg(better.carbon_emission()),
        worse.name(),
        format_kg(worse.carbon_emission())
    )
}

/// Footprint in plain decimal notation with at least one decimal place
/// (`2.0`, `0.35`, `10000000000000000.0`).
pub fn format_kg(value: f64) -> String {
    let plain = value.to_string();
    if !value.is_finite() || plain.contains('.') {
        plain
    } else {
        format!("{}.0", plain)
    }
}

/// First product with the lowest footprint.
pub fn lowest_emission<'p>(products: &[&'p ProductRecord]) -> Option<&'p ProductRecord> {
    products.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.carbon_emission() <= p.carbon_emission() => Some(b),
        _ => Some(p),
    })
}

/// First product with the highest footprint.
pub fn highest_emission<'p>(products: &[&'p ProductRecord]) -> Option<&'p ProductRecord> {
    products.iter().copied().fold(None, |best, p| match best {
        Some(b) if b.carbon_emission() >= p.carbon_emission() => Some(b),
        _ => Some(p),
    })
}

/// Recommendation pipeline over one snapshot.
pub struct RecommendationEngine<'a> {
    index: &'a CatalogIndex,
    matcher: &'a Matcher,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(index: &'a CatalogIndex, matcher: &'a Matcher) -> Self {
        Self { index, matcher }
    }

    pub fn recommend(&self, text: &str) -> RecommendationResult {
        let parsed = QueryParser::new(self.index, self.matcher).parse(text);

        if parsed.is_compare_intent {
            if let [a, b] = parsed.compare_targets.as_slice() {
                let (a, b) = (a.clone(), b.clone());
                return ComparisonResolver::new(self.index, self.matcher).compare_parsed(&a, &b, parsed);
            }
        }

        let category = match parsed.category() {
            Some(c) => c.to_string(),
            None => {
                return RecommendationResult::failure(
                    FailureKind::AmbiguousInput,
                    MSG_NO_PRODUCT,
                    parsed,
                )
            }
        };
        let size = parsed.size_filter().map(str::to_string);

        let mut eco = self
            .index
            .by_category_and_size(&category, size.as_deref(), EcoType::Eco);
        let mut non_eco = self
            .index
            .by_category_and_size(&category, size.as_deref(), EcoType::NonEco);

        if eco.is_empty() {
            if let Some(hit) = self.matcher.find_semantic(&category, self.index.categories()) {
                let matched = &self.index.categories()[hit.index];
                debug!(category = %category, matched = %matched, "semantic category retry");
                eco = self.index.by_category(matched, EcoType::Eco);
                non_eco = self.index.by_category(matched, EcoType::NonEco);
            }
        }

        match (lowest_emission(&eco), highest_emission(&non_eco)) {
            (Some(best), Some(reference)) => RecommendationResult::success(best, reference, parsed),
            _ => RecommendationResult::failure(FailureKind::NotFound, MSG_NO_ECO_ALTERNATIVE, parsed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassificationPolicy;
    use crate::models::CatalogRow;

    fn recommend(rows: Vec<CatalogRow>, text: &str) -> RecommendationResult {
        let index = CatalogIndex::build(rows, &ClassificationPolicy::default());
        let matcher = Matcher::default();
        RecommendationEngine::new(&index, &matcher).recommend(text)
    }

    fn drinkware() -> Vec<CatalogRow> {
        vec![
            CatalogRow::new(1, "Steel Bottle", "drinkware", 2.0).with_type("eco"),
            CatalogRow::new(2, "Plastic Bottle", "drinkware", 9.0).with_type("non-eco"),
        ]
    }

    #[test]
    fn recommends_eco_bottle_with_reason() {
        let result = recommend(drinkware(), "recommend a bottle");
        assert!(result.success);
        assert_eq!(result.recommended.as_ref().unwrap().name, "Steel Bottle");
        assert_eq!(result.compared_with.as_ref().unwrap().name, "Plastic Bottle");
        let reason = result.reason.unwrap();
        assert!(reason.contains("2.0"), "{}", reason);
        assert!(reason.contains("9.0"), "{}", reason);
        assert!(result.message.is_none());
    }

    #[test]
    fn no_eco_rows_is_not_found() {
        let rows = vec![
            CatalogRow::new(1, "Plastic Plate", "kitchen", 5.0).with_type("non-eco"),
            CatalogRow::new(2, "Foam Plate", "kitchen", 7.0).with_type("non-eco"),
        ];
        let result = recommend(rows, "I want a plate");
        assert!(!result.success);
        assert_eq!(result.kind, Some(FailureKind::NotFound));
        assert!(result.message.unwrap().contains("eco alternative"));
        assert!(result.recommended.is_none());
        assert_eq!(result.parsed.unwrap().category(), Some("kitchen"));
    }

    #[test]
    fn nothing_detected_is_ambiguous() {
        let result = recommend(drinkware(), "hello there");
        assert!(!result.success);
        assert_eq!(result.kind, Some(FailureKind::AmbiguousInput));
        assert_eq!(result.message.as_deref(), Some(MSG_NO_PRODUCT));
    }

    #[test]
    fn picks_lowest_eco_and_highest_non_eco() {
        let rows = vec![
            CatalogRow::new(1, "Glass Cup", "drinkware", 3.0).with_type("eco"),
            CatalogRow::new(2, "Steel Cup", "drinkware", 1.0).with_type("eco"),
            CatalogRow::new(3, "Bamboo Cup", "drinkware", 1.0).with_type("eco"),
            CatalogRow::new(4, "Paper Cup", "drinkware", 6.0).with_type("non-eco"),
            CatalogRow::new(5, "Foam Cup", "drinkware", 8.0).with_type("non-eco"),
        ];
        let result = recommend(rows, "need a cup");
        assert_eq!(result.recommended.unwrap().name, "Steel Cup");
        assert_eq!(result.compared_with.unwrap().name, "Foam Cup");
    }

    #[test]
    fn size_filter_applies_to_both_sets() {
        let rows = vec![
            CatalogRow::new(1, "Big Steel Bottle", "drinkware", 1.0)
                .with_type("eco")
                .with_size("large"),
            CatalogRow::new(2, "Small Steel Bottle", "drinkware", 2.0)
                .with_type("eco")
                .with_size("small"),
            CatalogRow::new(3, "Small Plastic Bottle", "drinkware", 4.0)
                .with_type("non-eco")
                .with_size("small"),
            CatalogRow::new(4, "Big Plastic Bottle", "drinkware", 9.0)
                .with_type("non-eco")
                .with_size("large"),
        ];
        let result = recommend(rows, "a small bottle please");
        assert_eq!(result.recommended.unwrap().name, "Small Steel Bottle");
        assert_eq!(result.compared_with.unwrap().name, "Small Plastic Bottle");
    }

    #[test]
    fn semantic_retry_finds_related_category() {
        // "shopping bag" is not a substring of "reusable bag", but shares "bag"
        let rows = vec![
            CatalogRow::new(1, "Jute Tote", "reusable bag", 0.5).with_type("eco"),
            CatalogRow::new(2, "Plastic Carrier", "reusable bag", 4.0).with_type("non-eco"),
            CatalogRow::new(3, "Steel Bottle", "drinkware", 2.0).with_type("eco"),
        ];
        let result = recommend(rows, "recommend a shopping bag");
        assert!(result.success, "{:?}", result);
        assert_eq!(result.recommended.unwrap().name, "Jute Tote");
    }

    #[test]
    fn compare_intent_is_delegated() {
        let rows = vec![
            CatalogRow::new(1, "Steel Bottle", "drinkware", 2.0).with_type("eco"),
            CatalogRow::new(2, "Plastic Comb", "hygiene", 3.0).with_type("non-eco"),
        ];
        let result = recommend(rows, "compare bottle and comb");
        assert!(result.success);
        assert_eq!(result.recommended.unwrap().name, "Steel Bottle");
        assert!(result.parsed.unwrap().is_compare_intent);
    }

    #[test]
    fn format_kg_keeps_a_decimal() {
        assert_eq!(format_kg(2.0), "2.0");
        assert_eq!(format_kg(0.35), "0.35");
        assert_eq!(format_kg(12.5), "12.5");
    }

    #[test]
    fn format_kg_never_uses_exponents() {
        assert_eq!(format_kg(1e16), "10000000000000000.0");
        assert_eq!(format_kg(1e-7), "0.0000001");
        assert_eq!(format_kg(0.0), "0.0");
    }

    #[test]
    fn product_word_with_category_word_recommends() {
        let rows = vec![
            CatalogRow::new(1, "Bamboo Plate", "kitchen", 1.0).with_type("eco"),
            CatalogRow::new(2, "Plastic Plate", "kitchen", 6.0).with_type("non-eco"),
        ];
        let result = recommend(rows, "recommend a plate for my kitchen");
        assert!(result.success, "{:?}", result);
        assert_eq!(result.recommended.unwrap().name, "Bamboo Plate");
        assert_eq!(result.compared_with.unwrap().name, "Plastic Plate");
        assert!(!result.parsed.unwrap().is_compare_intent);
    }

    #[test]
    fn result_serialization_omits_absent_fields() {
        let failure = RecommendationResult::failure(
            FailureKind::NotFound,
            MSG_NO_ECO_ALTERNATIVE,
            ParsedQuery::default(),
        );
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["kind"], "not_found");
        assert!(json.get("recommended").is_none());
        assert!(json.get("reason").is_none());
        assert!(json.get("parsed").is_some());
    }
}
