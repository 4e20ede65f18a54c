//! Free-text query parsing: category, size, and compare intent.
//!
//! Parsing is table-driven (see [`rules`](crate::rules)):
//!
//! 1. Normalize the text.
//! 2. Scan for whole-word category keywords. If none are found, compare
//!    every token against the synonym keywords with the fuzzy ratio, so
//!    typos and plurals ("botle", "cups") still resolve.
//! 3. Scan for the first size word.
//! 4. Two or more distinct keywords ⇒ compare intent on the first two.
//!    Exactly one ⇒ single-category lookup. A category name that repeats
//!    the category of a synonym hit ("plate for my kitchen") is dropped.
//! 5. No keyword ⇒ fuzzy-match the whole text against product names and
//!    take category and size from the matched product. Only the first
//!    [`NAME_QUERY_MAX_CHARS`] characters take part.

use serde::Serialize;

use crate::catalog::CatalogIndex;
use crate::matcher::{fuzzy_match, ratio, Matcher};
use crate::models::Size;
use crate::normalize::normalize;
use crate::rules::{is_synonym, scan_size, KeywordHit, COMPARE_ARITY};

/// Longest prefix of a query scored against product names.
pub const NAME_QUERY_MAX_CHARS: usize = 200;

/// Structured interpretation of one query. Echoed back in every result.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedQuery {
    pub raw_text: String,
    pub normalized: String,
    pub is_compare_intent: bool,
    /// Canonical categories of the detected keywords, in text order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// The keywords compared when `is_compare_intent` is set.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compare_targets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Category taken from a product matched by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_category: Option<String>,
    /// Size taken from a product matched by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_product: Option<String>,
}

impl ParsedQuery {
    pub(crate) fn unresolved(raw_text: &str, normalized: String) -> Self {
        Self {
            raw_text: raw_text.to_string(),
            normalized,
            ..Default::default()
        }
    }

    /// Query for a direct two-name comparison.
    pub fn for_comparison(name_a: &str, name_b: &str) -> Self {
        let raw_text = format!("{} vs {}", name_a, name_b);
        Self {
            normalized: normalize(&raw_text),
            raw_text,
            is_compare_intent: true,
            compare_targets: vec![name_a.to_string(), name_b.to_string()],
            ..Default::default()
        }
    }

    /// Category to filter on: the detected keyword's, else the fallback's.
    pub fn category(&self) -> Option<&str> {
        self.categories
            .first()
            .map(String::as_str)
            .or(self.resolved_category.as_deref())
    }

    /// Size to filter on: a size word in the query, else the fallback's.
    pub fn size_filter(&self) -> Option<&str> {
        self.size
            .map(|s| s.as_str())
            .or(self.resolved_size.as_deref())
    }

    pub fn is_resolved(&self) -> bool {
        self.is_compare_intent || self.category().is_some()
    }
}

/// Parser bound to one catalog snapshot.
pub struct QueryParser<'a> {
    index: &'a CatalogIndex,
    matcher: &'a Matcher,
}

impl<'a> QueryParser<'a> {
    pub fn new(index: &'a CatalogIndex, matcher: &'a Matcher) -> Self {
        Self { index, matcher }
    }

    pub fn parse(&self, text: &str) -> ParsedQuery {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return ParsedQuery::unresolved(text, normalized);
        }

        let hits = self.detect_keywords(&normalized);
        let size = scan_size(&normalized);

        if hits.len() >= COMPARE_ARITY {
            let hits = &hits[..COMPARE_ARITY];
            return ParsedQuery {
                raw_text: text.to_string(),
                normalized,
                is_compare_intent: true,
                categories: hits.iter().map(|h| h.category.clone()).collect(),
                compare_targets: hits.iter().map(|h| h.keyword.clone()).collect(),
                size,
                ..Default::default()
            };
        }

        if let Some(hit) = hits.first() {
            return ParsedQuery {
                raw_text: text.to_string(),
                normalized,
                categories: vec![hit.category.clone()],
                size,
                ..Default::default()
            };
        }

        let names = self.index.names_norm();
        let term: String = normalized.chars().take(NAME_QUERY_MAX_CHARS).collect();
        match fuzzy_match(&term, names, self.matcher.policy().name_threshold) {
            Some(hit) => {
                let product = &self.index.products()[hit.index];
                ParsedQuery {
                    raw_text: text.to_string(),
                    normalized,
                    size,
                    resolved_category: Some(product.category_norm().to_string()),
                    resolved_size: Some(product.size_norm().to_string()),
                    matched_product: Some(product.name().to_string()),
                    ..Default::default()
                }
            }
            None => ParsedQuery::unresolved(text, normalized),
        }
    }

    /// Distinct keyword hits: direct whole-word hits, else fuzzy synonym hits.
    ///
    /// Category-name hits whose category a synonym hit already covers are
    /// dropped.
    fn detect_keywords(&self, normalized: &str) -> Vec<KeywordHit> {
        let rules = self.index.keyword_rules();
        let mut hits = rules.scan(normalized);

        if hits.is_empty() {
            let threshold = self.matcher.policy().keyword_threshold;
            for (position, token) in normalized.split_whitespace().enumerate() {
                for rule in rules.synonym_rules() {
                    if ratio(token, &rule.keyword) >= threshold {
                        hits.push(KeywordHit {
                            keyword: rule.keyword.clone(),
                            category: rule.category.clone(),
                            position,
                        });
                    }
                }
            }
        }

        let mut distinct: Vec<KeywordHit> = Vec::with_capacity(hits.len());
        for hit in hits {
            if !distinct.iter().any(|d| d.keyword == hit.keyword) {
                distinct.push(hit);
            }
        }

        let synonym_categories: Vec<String> = distinct
            .iter()
            .filter(|h| is_synonym(&h.keyword))
            .map(|h| h.category.clone())
            .collect();
        distinct.retain(|h| is_synonym(&h.keyword) || !synonym_categories.contains(&h.category));
        distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClassificationPolicy;
    use crate::models::CatalogRow;

    fn index() -> CatalogIndex {
        CatalogIndex::build(
            vec![
                CatalogRow::new(1, "Steel Water Bottle", "drinkware", 2.0)
                    .with_type("eco")
                    .with_size("large"),
                CatalogRow::new(2, "Bamboo Toothbrush", "hygiene", 0.4).with_type("eco"),
                CatalogRow::new(3, "Beeswax Food Wrap", "food storage", 0.8).with_type("eco"),
            ],
            &ClassificationPolicy::default(),
        )
    }

    fn parse(text: &str) -> ParsedQuery {
        let index = index();
        let matcher = Matcher::default();
        QueryParser::new(&index, &matcher).parse(text)
    }

    #[test]
    fn single_synonym_with_size() {
        let q = parse("Recommend a SMALL bottle!");
        assert!(!q.is_compare_intent);
        assert_eq!(q.category(), Some("drinkware"));
        assert_eq!(q.size, Some(Size::Small));
        assert_eq!(q.size_filter(), Some("small"));
    }

    #[test]
    fn two_keywords_mean_compare() {
        let q = parse("compare a cup and a comb");
        assert!(q.is_compare_intent);
        assert_eq!(q.compare_targets, vec!["cup", "comb"]);
        assert_eq!(q.categories, vec!["drinkware", "hygiene"]);
    }

    #[test]
    fn repeated_keyword_is_not_compare() {
        let q = parse("compare eco bag and plastic bag");
        assert!(!q.is_compare_intent);
        assert_eq!(q.category(), Some("shopping bag"));
    }

    #[test]
    fn product_word_with_its_own_category_is_not_compare() {
        let q = parse("recommend a plate for my kitchen");
        assert!(!q.is_compare_intent);
        assert!(q.compare_targets.is_empty());
        assert_eq!(q.categories, vec!["kitchen"]);

        let q = parse("a toothbrush from hygiene, maybe a comb");
        assert!(!q.is_compare_intent);
        assert_eq!(q.category(), Some("hygiene"));
    }

    #[test]
    fn category_names_of_different_categories_compare() {
        let q = parse("drinkware or hygiene");
        assert!(q.is_compare_intent);
        assert_eq!(q.categories, vec!["drinkware", "hygiene"]);
    }

    #[test]
    fn long_query_still_matches_product_name() {
        let text = format!("beeswax food wrap {}", "please ".repeat(500));
        let q = parse(&text);
        assert_eq!(q.matched_product.as_deref(), Some("Beeswax Food Wrap"));
    }

    #[test]
    fn catalog_category_is_a_keyword() {
        let q = parse("any food storage ideas");
        assert_eq!(q.category(), Some("food storage"));
    }

    #[test]
    fn fuzzy_keyword_fallback_catches_typos() {
        let q = parse("recommend a botle");
        assert_eq!(q.category(), Some("drinkware"));
    }

    #[test]
    fn fuzzy_keyword_fallback_is_token_level() {
        // "recommend" shares letters with "comb" but is not a typo of it
        let q = parse("please recommend some cups");
        assert!(!q.is_compare_intent);
        assert_eq!(q.category(), Some("drinkware"));
    }

    #[test]
    fn falls_back_to_product_name() {
        let q = parse("beeswax food wrap");
        assert_eq!(q.category(), Some("food storage"));
        assert_eq!(q.matched_product.as_deref(), Some("Beeswax Food Wrap"));
        assert_eq!(q.resolved_size.as_deref(), Some("medium"));
    }

    #[test]
    fn unrelated_text_is_unresolved() {
        let q = parse("hello there");
        assert!(!q.is_resolved());
        assert_eq!(q.category(), None);
        assert!(!parse("!!!").is_resolved());
    }

    #[test]
    fn comparison_query_carries_targets() {
        let q = ParsedQuery::for_comparison("EcoBag", "Plastic Bag");
        assert!(q.is_compare_intent);
        assert_eq!(q.raw_text, "EcoBag vs Plastic Bag");
        assert_eq!(q.normalized, "ecobag vs plastic bag");
    }
}
