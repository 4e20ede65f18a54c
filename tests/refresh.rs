use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use ecomatch::timeout::TimeoutSource;
use ecomatch_core::source::memory::InMemorySource;
use ecomatch_core::{CatalogRow, CatalogSource, EngineError, EngineSettings, FailureKind, Recommender};

/// Serves a new catalog version on every fetch, after a delay.
///
/// Version `v` has an eco bottle at `v` kg and a conventional one at
/// `v + 100` kg, so a result mixing two versions is detectable.
struct VersionedSource {
    version: AtomicU64,
    delay_ms: AtomicU64,
    fail: AtomicBool,
}

impl VersionedSource {
    fn new(delay: Duration) -> Self {
        Self {
            version: AtomicU64::new(0),
            delay_ms: AtomicU64::new(delay.as_millis() as u64),
            fail: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl CatalogSource for VersionedSource {
    fn name(&self) -> &str {
        "versioned"
    }

    async fn fetch(&self) -> Result<Vec<CatalogRow>> {
        let v = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(Duration::from_millis(self.delay_ms.load(Ordering::SeqCst))).await;
        if self.fail.load(Ordering::SeqCst) {
            bail!("listing offline");
        }
        let eco = v as f64;
        Ok(vec![
            CatalogRow::new(1, "Steel Bottle", "drinkware", eco).with_type("eco"),
            CatalogRow::new(2, "Plastic Bottle", "drinkware", eco + 100.0).with_type("non-eco"),
        ])
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_readers_never_see_mixed_catalogs() {
    let source = VersionedSource::new(Duration::from_millis(5));
    let engine = Arc::new(Recommender::new(source, EngineSettings::default()).await);
    assert!(engine.has_snapshot());

    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let stop = Arc::clone(&stop);
        readers.push(tokio::spawn(async move {
            let mut last_seen = 0.0;
            let mut answers = 0usize;
            while !stop.load(Ordering::SeqCst) {
                let result = engine.recommend("recommend a bottle");
                assert!(result.success, "{:?}", result.message);
                let eco = result.recommended.unwrap().carbon_emission;
                let non_eco = result.compared_with.unwrap().carbon_emission;
                assert_eq!(non_eco, eco + 100.0, "result mixes two catalog versions");
                assert!(eco >= last_seen, "snapshot went backwards");
                last_seen = eco;
                answers += 1;
                tokio::task::yield_now().await;
            }
            answers
        }));
    }

    for _ in 0..20 {
        engine.refresh().await.unwrap();
    }
    stop.store(true, Ordering::SeqCst);

    for reader in readers {
        assert!(reader.await.unwrap() > 0);
    }
    let final_eco = engine.snapshot().unwrap().products()[0].carbon_emission();
    assert_eq!(final_eco, 21.0);
}

#[tokio::test]
async fn failed_refresh_serves_stale_snapshot() {
    let source = Arc::new(VersionedSource::new(Duration::from_millis(1)));
    let engine = Recommender::new(Arc::clone(&source), EngineSettings::default()).await;

    source.fail.store(true, Ordering::SeqCst);
    let err = engine.refresh().await.unwrap_err();
    assert!(matches!(err, EngineError::Source { .. }));

    let result = engine.recommend("recommend a bottle");
    assert!(result.success);
    assert_eq!(result.recommended.unwrap().carbon_emission, 1.0);
}

#[tokio::test]
async fn timed_out_refresh_keeps_previous_snapshot() {
    let source = Arc::new(VersionedSource::new(Duration::from_millis(1)));
    let engine = Recommender::new(
        TimeoutSource::new(Arc::clone(&source), Duration::from_millis(100)),
        EngineSettings::default(),
    )
    .await;
    assert!(engine.has_snapshot());

    source.delay_ms.store(5_000, Ordering::SeqCst);
    let err = engine.refresh().await.unwrap_err();
    assert!(err.to_string().contains("timed out"));

    let result = engine.recommend("recommend a bottle");
    assert!(result.success);
    assert_eq!(result.recommended.unwrap().carbon_emission, 1.0);
}

#[tokio::test]
async fn slow_older_refresh_does_not_overwrite_newer_one() {
    let source = Arc::new(VersionedSource::new(Duration::from_millis(1)));
    let engine = Recommender::new(Arc::clone(&source), EngineSettings::default()).await;

    source.delay_ms.store(200, Ordering::SeqCst);
    let (older, newer) = tokio::join!(engine.refresh(), async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        source.delay_ms.store(1, Ordering::SeqCst);
        engine.refresh().await
    });

    let newer = newer.unwrap();
    assert!(newer.changed);
    assert!(matches!(
        older,
        Err(EngineError::Superseded {
            generation: 2,
            published: 3
        })
    ));
    assert_eq!(engine.snapshot().unwrap().products()[0].carbon_emission(), 3.0);
    assert_eq!(engine.recommend("recommend a bottle").recommended.unwrap().carbon_emission, 3.0);
}

#[tokio::test]
async fn timed_out_initial_load_leaves_engine_unavailable() {
    let slow = VersionedSource::new(Duration::from_secs(5));
    let engine = Recommender::new(
        TimeoutSource::new(slow, Duration::from_millis(50)),
        EngineSettings::default(),
    )
    .await;
    assert!(!engine.has_snapshot());

    let result = engine.recommend("recommend a bottle");
    assert!(!result.success);
    assert_eq!(result.kind, Some(FailureKind::SourceUnavailable));
    assert_eq!(result.message.as_deref(), Some("Product catalog is currently unavailable."));
}

#[tokio::test]
async fn engine_recovers_once_source_returns() {
    let source = Arc::new(InMemorySource::new(Vec::new()));
    source.set_unavailable(true);
    let engine = Recommender::new(Arc::clone(&source), EngineSettings::default()).await;

    let result = engine.compare("Steel Bottle", "Plastic Bottle");
    assert_eq!(result.kind, Some(FailureKind::SourceUnavailable));

    source.set_rows(vec![
        CatalogRow::new(1, "Steel Bottle", "drinkware", 2.0).with_type("eco"),
        CatalogRow::new(2, "Plastic Bottle", "drinkware", 9.0).with_type("non-eco"),
    ]);
    source.set_unavailable(false);
    let report = engine.refresh().await.unwrap();
    assert!(report.changed);
    assert_eq!(report.products, 2);

    let result = engine.compare("Plastic Bottle", "Steel Bottle");
    assert!(result.success);
    assert_eq!(result.recommended.unwrap().name, "Steel Bottle");
}
