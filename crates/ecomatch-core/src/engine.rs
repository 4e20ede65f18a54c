//! Snapshot-holding front door: `recommend`, `compare`, `refresh`.
//!
//! The [`Recommender`] owns a [`CatalogSource`] and the current
//! [`CatalogIndex`] snapshot behind an [`ArcSwapOption`]. Queries load the
//! snapshot once and run against that `Arc` to completion; `refresh` builds
//! a new index off to the side and publishes it with a single store, so a
//! query observes either the old snapshot or the new one in full.
//!
//! Every refresh takes a generation number when it starts. A refresh only
//! publishes if no later-started refresh has published first, so a slow,
//! older fetch never replaces a newer snapshot.
//!
//! A failed refresh leaves the previous snapshot serving. Without any
//! snapshot, queries fail fast with [`FailureKind::SourceUnavailable`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::catalog::{CatalogIndex, ClassificationPolicy, DataIssue};
use crate::compare::ComparisonResolver;
use crate::error::{EngineError, FailureKind};
use crate::matcher::{MatchPolicy, Matcher};
use crate::normalize::normalize;
use crate::query::ParsedQuery;
use crate::recommend::{RecommendationEngine, RecommendationResult, MSG_SOURCE_UNAVAILABLE};
use crate::source::CatalogSource;

/// Tunable engine parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub matching: MatchPolicy,
    #[serde(default)]
    pub classification: ClassificationPolicy,
}

/// Summary of one successful refresh.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshReport {
    pub source: String,
    pub rows_fetched: usize,
    pub products: usize,
    pub eco: usize,
    pub non_eco: usize,
    /// Adaptive threshold, if any row needed classification.
    pub threshold: Option<f64>,
    pub issues: Vec<DataIssue>,
    pub digest: String,
    /// `false` when the fetched rows match the previous snapshot's.
    pub changed: bool,
    pub built_at: DateTime<Utc>,
}

impl RefreshReport {
    fn new(source: &str, rows_fetched: usize, index: &CatalogIndex, changed: bool) -> Self {
        Self {
            source: source.to_string(),
            rows_fetched,
            products: index.len(),
            eco: index.eco_count(),
            non_eco: index.non_eco_count(),
            threshold: index.threshold(),
            issues: index.issues().to_vec(),
            digest: index.digest().to_string(),
            changed,
            built_at: index.built_at(),
        }
    }
}

/// Recommendation engine over an atomically swappable catalog snapshot.
pub struct Recommender<S> {
    source: S,
    matcher: Matcher,
    classification: ClassificationPolicy,
    snapshot: ArcSwapOption<CatalogIndex>,
    /// Last generation handed to a starting refresh.
    started: AtomicU64,
    /// Generation of the published snapshot; guards the store.
    published: Mutex<u64>,
}

impl<S: CatalogSource> Recommender<S> {
    /// Create the engine and perform the initial load.
    ///
    /// A failed initial load is logged; the engine then answers every query
    /// with `SourceUnavailable` until a refresh succeeds.
    pub async fn new(source: S, settings: EngineSettings) -> Self {
        let engine = Self::without_snapshot(source, settings);
        if let Err(e) = engine.refresh().await {
            warn!(error = %e, "initial catalog load failed, serving without a snapshot");
        }
        engine
    }

    /// Create the engine without loading anything.
    pub fn without_snapshot(source: S, settings: EngineSettings) -> Self {
        Self {
            source,
            matcher: Matcher::new(settings.matching),
            classification: settings.classification,
            snapshot: ArcSwapOption::empty(),
            started: AtomicU64::new(0),
            published: Mutex::new(0),
        }
    }

    /// Fetch, rebuild, and publish a new snapshot.
    ///
    /// On error the previous snapshot stays in place. The error is returned
    /// once; there is no retry.
    pub async fn refresh(&self) -> Result<RefreshReport, EngineError> {
        let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
        let source_name = self.source.name().to_string();

        let rows = match self.source.fetch().await {
            Ok(rows) => rows,
            Err(cause) => {
                let err = EngineError::Source {
                    source_name,
                    cause,
                };
                warn!(error = %err, stale = self.has_snapshot(), "catalog refresh failed");
                return Err(err);
            }
        };
        if rows.is_empty() {
            warn!(source = %source_name, stale = self.has_snapshot(), "catalog refresh returned no rows");
            return Err(EngineError::EmptyCatalog(source_name));
        }

        let rows_fetched = rows.len();
        let index = CatalogIndex::build(rows, &self.classification);

        let report = {
            let mut published = self.published.lock().unwrap_or_else(|e| e.into_inner());
            if *published > generation {
                warn!(source = %source_name, generation, newer = *published, "discarding superseded catalog refresh");
                return Err(EngineError::Superseded {
                    generation,
                    published: *published,
                });
            }
            let changed = self
                .snapshot
                .load_full()
                .map_or(true, |old| old.digest() != index.digest());
            let report = RefreshReport::new(&source_name, rows_fetched, &index, changed);
            self.snapshot.store(Some(Arc::new(index)));
            *published = generation;
            report
        };

        info!(
            source = %source_name,
            products = report.products,
            changed = report.changed,
            generation,
            "catalog snapshot published"
        );
        Ok(report)
    }

    /// The snapshot currently serving queries.
    pub fn snapshot(&self) -> Option<Arc<CatalogIndex>> {
        self.snapshot.load_full()
    }

    pub fn has_snapshot(&self) -> bool {
        self.snapshot.load().is_some()
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn recommend(&self, text: &str) -> RecommendationResult {
        match self.snapshot.load_full() {
            Some(index) => RecommendationEngine::new(&index, &self.matcher).recommend(text),
            None => unavailable(ParsedQuery::unresolved(text, normalize(text))),
        }
    }

    pub fn compare(&self, name_a: &str, name_b: &str) -> RecommendationResult {
        match self.snapshot.load_full() {
            Some(index) => ComparisonResolver::new(&index, &self.matcher).compare(name_a, name_b),
            None => unavailable(ParsedQuery::for_comparison(name_a, name_b)),
        }
    }
}

fn unavailable(parsed: ParsedQuery) -> RecommendationResult {
    RecommendationResult::failure(FailureKind::SourceUnavailable, MSG_SOURCE_UNAVAILABLE, parsed)
}
