//! Two-stage string matcher: fuzzy partial ratio, then TF-IDF cosine.
//!
//! # Algorithm
//!
//! 1. **Fuzzy.** Score the term against every candidate with
//!    [`partial_ratio`] (0–100). The best candidate wins if its score is at
//!    least the threshold.
//! 2. **Semantic.** Only when stage 1 finds nothing: fit TF-IDF over the
//!    term plus all candidates and take the candidate with the highest
//!    cosine similarity, if it is strictly above the semantic threshold.
//!
//! A stage-1 hit always wins. "No match" is `None` and is a normal outcome.
//! Ties keep the earliest candidate.

use std::collections::HashMap;

use rapidfuzz::distance::indel;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::normalize::normalize;

/// Default fuzzy acceptance score.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 70.0;
/// Default semantic acceptance similarity (exclusive).
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.25;

/// Matching thresholds, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Default minimum partial-ratio score (0–100).
    pub fuzzy_threshold: f64,
    /// Minimum token-to-keyword ratio when no keyword appears verbatim.
    pub keyword_threshold: f64,
    /// Minimum partial-ratio score for whole-text and product-name matching.
    pub name_threshold: f64,
    /// Cosine similarity a semantic match must exceed.
    pub semantic_threshold: f64,
}

impl Default for MatchPolicy {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            keyword_threshold: 80.0,
            name_threshold: 65.0,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
        }
    }
}

/// Which stage produced a [`Match`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStage {
    Fuzzy,
    Semantic,
}

/// A successful match against a candidate list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    /// Index into the candidate slice.
    pub index: usize,
    /// Partial ratio (0–100) for fuzzy matches, cosine (0–1) for semantic.
    pub score: f64,
    pub stage: MatchStage,
}

/// Fuzzy + semantic matcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matcher {
    policy: MatchPolicy,
}

impl Matcher {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Two-stage match with an explicit fuzzy threshold.
    pub fn find<S: AsRef<str>>(&self, term: &str, candidates: &[S], threshold: f64) -> Option<Match> {
        if let Some(hit) = fuzzy_match(term, candidates, threshold) {
            debug!(term, index = hit.index, score = hit.score, "fuzzy match");
            return Some(hit);
        }
        let hit = semantic_match(term, candidates, self.policy.semantic_threshold);
        match &hit {
            Some(m) => debug!(term, index = m.index, score = m.score, "semantic match"),
            None => debug!(term, "no match"),
        }
        hit
    }

    /// Semantic stage only, at the policy's semantic threshold.
    pub fn find_semantic<S: AsRef<str>>(&self, term: &str, candidates: &[S]) -> Option<Match> {
        semantic_match(term, candidates, self.policy.semantic_threshold)
    }
}

/// Stage 1: best partial ratio across candidates, if it reaches `threshold`.
pub fn fuzzy_match<S: AsRef<str>>(term: &str, candidates: &[S], threshold: f64) -> Option<Match> {
    let term = normalize(term);
    if term.is_empty() {
        return None;
    }

    let mut best: Option<Match> = None;
    for (index, candidate) in candidates.iter().enumerate() {
        let score = partial_ratio(&term, &normalize(candidate.as_ref()));
        if best.map_or(true, |b| score > b.score) {
            best = Some(Match {
                index,
                score,
                stage: MatchStage::Fuzzy,
            });
        }
    }

    best.filter(|b| b.score >= threshold)
}

/// Stage 2: best TF-IDF cosine similarity, if it exceeds `threshold`.
pub fn semantic_match<S: AsRef<str>>(term: &str, candidates: &[S], threshold: f64) -> Option<Match> {
    if candidates.is_empty() {
        return None;
    }

    let mut docs: Vec<String> = Vec::with_capacity(candidates.len() + 1);
    docs.push(normalize(term));
    docs.extend(candidates.iter().map(|c| normalize(c.as_ref())));

    let vectors = tfidf_vectors(&docs);
    let (query, rest) = vectors.split_first()?;
    if query.is_empty() {
        return None;
    }

    let mut best: Option<Match> = None;
    for (index, vector) in rest.iter().enumerate() {
        let score = sparse_cosine(query, vector);
        if best.map_or(true, |b| score > b.score) {
            best = Some(Match {
                index,
                score,
                stage: MatchStage::Semantic,
            });
        }
    }

    best.filter(|b| b.score > threshold)
}

/// Partial ratio in `[0, 100]`.
///
/// Aligns the shorter string against every equal-length window of the
/// longer one (plus the partial windows at both edges) and returns the best
/// [`ratio`] found.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let (short, long) = if a_chars.len() <= b_chars.len() {
        (a_chars, b_chars)
    } else {
        (b_chars, a_chars)
    };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let m = short.len();
    let n = long.len();

    let mut best = 0.0f64;
    for start in 0..=(n - m) {
        best = best.max(indel_ratio(&short, &long[start..start + m]));
        if best >= 100.0 {
            return 100.0;
        }
    }
    for len in 1..m.min(n + 1) {
        best = best.max(indel_ratio(&short, &long[..len]));
        best = best.max(indel_ratio(&short, &long[n - len..]));
    }
    best
}

/// Indel similarity in `[0, 100]`: `100 * (1 - indel / (len(a) + len(b)))`.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    indel_ratio(&a, &b)
}

fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    let distance = indel::distance(a.iter().copied(), b.iter().copied());
    100.0 * (1.0 - distance as f64 / total as f64)
}

type SparseVector = HashMap<usize, f64>;

/// Tokens of two or more characters, as TF-IDF vocabulary entries.
fn tokenize(doc: &str) -> impl Iterator<Item = &str> {
    doc.split_whitespace().filter(|t| t.chars().count() >= 2)
}

/// L2-normalized TF-IDF vectors with smoothed idf: `ln((1+n)/(1+df)) + 1`.
fn tfidf_vectors(docs: &[String]) -> Vec<SparseVector> {
    let mut vocab: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<HashMap<usize, f64>> = Vec::with_capacity(docs.len());

    for doc in docs {
        let mut tf: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(doc) {
            let next_id = vocab.len();
            let id = *vocab.entry(token).or_insert(next_id);
            *tf.entry(id).or_insert(0.0) += 1.0;
        }
        counts.push(tf);
    }

    let mut df = vec![0usize; vocab.len()];
    for tf in &counts {
        for id in tf.keys() {
            df[*id] += 1;
        }
    }

    let n = docs.len() as f64;
    let idf: Vec<f64> = df
        .iter()
        .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
        .collect();

    counts
        .into_iter()
        .map(|tf| {
            let mut v: SparseVector = tf.into_iter().map(|(id, c)| (id, c * idf[id])).collect();
            let norm = v.values().map(|x| x * x).sum::<f64>().sqrt();
            if norm > f64::EPSILON {
                for x in v.values_mut() {
                    *x /= norm;
                }
            }
            v
        })
        .collect()
}

fn sparse_cosine(a: &SparseVector, b: &SparseVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(id, x)| large.get(id).map(|y| x * y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_ratio_exact_substring_is_perfect() {
        assert_eq!(partial_ratio("bottle", "recommend a bottle"), 100.0);
        assert_eq!(partial_ratio("recommend a bottle", "bottle"), 100.0);
    }

    #[test]
    fn partial_ratio_tolerates_typos() {
        let score = partial_ratio("bottle", "recommend a botle please");
        assert!(score >= 70.0, "score was {}", score);
    }

    #[test]
    fn partial_ratio_rejects_unrelated() {
        let score = partial_ratio("straw", "recommend a bottle");
        assert!(score < 70.0, "score was {}", score);
    }

    #[test]
    fn ratio_counts_indel_edits() {
        assert_eq!(ratio("bottle", "bottle"), 100.0);
        // one deletion plus one insertion: 1 - 2 / 8
        assert!((ratio("abcd", "abxd") - 75.0).abs() < 1e-9);
        assert_eq!(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn partial_ratio_empty_inputs() {
        assert_eq!(partial_ratio("", ""), 100.0);
        assert_eq!(partial_ratio("", "abc"), 0.0);
    }

    #[test]
    fn fuzzy_picks_best_candidate() {
        let candidates = ["Plastic Bag", "Bamboo Toothbrush", "Steel Bottle"];
        let hit = fuzzy_match("steel bottle", &candidates, 70.0).unwrap();
        assert_eq!(hit.index, 2);
        assert_eq!(hit.stage, MatchStage::Fuzzy);
    }

    #[test]
    fn fuzzy_below_threshold_is_none() {
        let candidates = ["Plastic Bag"];
        assert!(fuzzy_match("xyz zzz qqq", &candidates, 70.0).is_none());
        assert!(fuzzy_match("", &candidates, 0.0).is_none());
    }

    #[test]
    fn semantic_matches_on_shared_terms() {
        let candidates = ["kitchen utensils", "personal hygiene", "reusable shopping bag"];
        let hit = semantic_match("hygiene products", &candidates, 0.25).unwrap();
        assert_eq!(hit.index, 1);
        assert_eq!(hit.stage, MatchStage::Semantic);
    }

    #[test]
    fn semantic_without_overlap_is_none() {
        let candidates = ["kitchen", "drinkware"];
        assert!(semantic_match("garden hose", &candidates, 0.25).is_none());
        assert!(semantic_match("a", &candidates, 0.0).is_none());
        let empty: [&str; 0] = [];
        assert!(semantic_match("kitchen", &empty, 0.25).is_none());
    }

    #[test]
    fn fuzzy_hit_wins_over_semantic() {
        let matcher = Matcher::default();
        let candidates = ["bamboo cup", "bamboo"];
        let hit = matcher.find("bamboo", &candidates, 70.0).unwrap();
        assert_eq!(hit.stage, MatchStage::Fuzzy);
        // Both contain "bamboo" exactly; the first candidate wins the tie.
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn falls_back_to_semantic_when_fuzzy_fails() {
        let matcher = Matcher::default();
        let candidates = ["organic cotton tote", "plastic carrier"];
        let hit = matcher
            .find("tote for groceries made of organic cotton", &candidates, 99.0)
            .unwrap();
        assert_eq!(hit.stage, MatchStage::Semantic);
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn tfidf_vectors_are_unit_length() {
        let docs = vec!["eco bag".to_string(), "eco bottle bottle".to_string()];
        for v in tfidf_vectors(&docs) {
            let norm: f64 = v.values().map(|x| x * x).sum::<f64>().sqrt();
            assert!((norm - 1.0).abs() < 1e-9);
        }
    }
}
