//! Declarative rule tables for query parsing.
//!
//! | Table | Maps |
//! |-------|------|
//! | [`CATEGORY_SYNONYMS`] | colloquial keyword → canonical catalog category |
//! | [`SIZE_KEYWORDS`] | size word → [`Size`] |
//! | [`COMPARE_ARITY`] | distinct categories needed for compare intent |
//!
//! [`KeywordRules`] combines the static tables with the live catalog's
//! category vocabulary, so a category that exists in the catalog is always
//! recognised by its own name.

use crate::models::Size;
use crate::normalize::normalize;

/// Colloquial keyword → canonical category.
pub const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("bottle", "drinkware"),
    ("cup", "drinkware"),
    ("bag", "shopping bag"),
    ("brush", "hygiene"),
    ("comb", "hygiene"),
    ("plate", "kitchen"),
    ("straw", "kitchen"),
];

/// Size words recognised in queries.
pub const SIZE_KEYWORDS: &[(&str, Size)] = &[
    ("small", Size::Small),
    ("medium", Size::Medium),
    ("large", Size::Large),
];

/// Number of distinct keyword hits in one query that turns it into a comparison.
///
/// A catalog category name only counts when no synonym in the same query
/// already named that category.
pub const COMPARE_ARITY: usize = 2;

/// One keyword rule: a whole-word phrase and the category it resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: String,
}

/// A keyword occurrence in normalized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordHit {
    pub keyword: String,
    pub category: String,
    /// Token offset of the first word of the hit.
    pub position: usize,
}

/// Keyword table used by the parser.
#[derive(Debug, Clone, Default)]
pub struct KeywordRules {
    rules: Vec<KeywordRule>,
}

impl KeywordRules {
    /// Static synonyms, their canonical categories, and `vocabulary`
    /// (the catalog's normalized categories), each mapped to itself.
    pub fn with_vocabulary<S: AsRef<str>>(vocabulary: &[S]) -> Self {
        let mut table = Self::default();
        for (keyword, category) in CATEGORY_SYNONYMS {
            table.push(keyword, category);
        }
        for (_, category) in CATEGORY_SYNONYMS {
            table.push(category, category);
        }
        for category in vocabulary {
            let category = category.as_ref();
            table.push(category, category);
        }
        table
    }

    fn push(&mut self, keyword: &str, category: &str) {
        let keyword = normalize(keyword);
        let category = normalize(category);
        if keyword.is_empty() || self.rules.iter().any(|r| r.keyword == keyword) {
            return;
        }
        self.rules.push(KeywordRule { keyword, category });
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    /// The colloquial synonym keywords, in table order.
    pub fn synonym_rules(&self) -> impl Iterator<Item = &KeywordRule> {
        self.rules.iter().filter(|r| is_synonym(&r.keyword))
    }

    /// Canonical category for a keyword, if the keyword is known.
    pub fn category_for(&self, keyword: &str) -> Option<&str> {
        let keyword = normalize(keyword);
        self.rules
            .iter()
            .find(|r| r.keyword == keyword)
            .map(|r| r.category.as_str())
    }

    /// Whole-word keyword hits in `text` (already normalized).
    ///
    /// Longer phrases win over shorter ones on overlap; hits come back in
    /// text order.
    pub fn scan(&self, text: &str) -> Vec<KeywordHit> {
        let tokens: Vec<&str> = text.split_whitespace().collect();

        let mut candidates: Vec<(usize, usize, &KeywordRule)> = Vec::new();
        for rule in &self.rules {
            let words: Vec<&str> = rule.keyword.split(' ').collect();
            if words.len() > tokens.len() {
                continue;
            }
            for start in 0..=(tokens.len() - words.len()) {
                if tokens[start..start + words.len()] == words[..] {
                    candidates.push((start, words.len(), rule));
                }
            }
        }

        // longest first, then earliest
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut taken = vec![false; tokens.len()];
        let mut hits: Vec<KeywordHit> = Vec::new();
        for (start, len, rule) in candidates {
            if taken[start..start + len].iter().any(|t| *t) {
                continue;
            }
            taken[start..start + len].iter_mut().for_each(|t| *t = true);
            hits.push(KeywordHit {
                keyword: rule.keyword.clone(),
                category: rule.category.clone(),
                position: start,
            });
        }

        hits.sort_by_key(|h| h.position);
        hits
    }
}

/// Whether `keyword` (normalized) is one of the colloquial synonyms rather
/// than a category name.
pub fn is_synonym(keyword: &str) -> bool {
    CATEGORY_SYNONYMS.iter().any(|(k, _)| *k == keyword)
}

/// First size word in normalized text.
pub fn scan_size(text: &str) -> Option<Size> {
    text.split_whitespace().find_map(|token| {
        SIZE_KEYWORDS
            .iter()
            .find(|(word, _)| *word == token)
            .map(|(_, size)| *size)
    })
}
