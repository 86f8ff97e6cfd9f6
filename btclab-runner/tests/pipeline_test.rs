//! End-to-end pipeline tests on synthetic and cached data.
//!
//! These tests run the full forecast path (fuse, train, predict,
//! explain) without touching the network: payloads are either generated
//! synthetically or pre-seeded into a fetch cache.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;

use btclab_core::data::{
    CacheKey, FetchCache, ACTIVITY_TTL_SECS, HASHRATE_TTL_SECS, PRICE_TTL_SECS,
    SENTIMENT_TTL_SECS,
};
use btclab_core::model::{Backend, GbtParams};
use btclab_core::signal::TradingSignal;
use btclab_runner::config::ForecastConfig;
use btclab_runner::export::{
    export_features_csv, import_features_csv, load_manifest, save_artifacts,
};
use btclab_runner::runner::{
    forecast_from_inputs, run_forecast, AttributionOutcome, PipelineRun, RunOptions, RunOutcome,
};
use btclab_runner::sources::compute_dataset_hash;
use btclab_runner::synthetic::synthetic_inputs;

static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

fn temp_dir(prefix: &str) -> PathBuf {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("btclab_{prefix}_{}_{id}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_config() -> ForecastConfig {
    ForecastConfig {
        range: "200d".into(),
        model: GbtParams {
            n_trees: 30,
            ..GbtParams::default()
        },
        ..ForecastConfig::default()
    }
}

fn end_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

fn run_synthetic(config: &ForecastConfig) -> PipelineRun {
    let inputs = synthetic_inputs(config, end_date());
    let hash = compute_dataset_hash(&inputs);
    forecast_from_inputs(config, inputs, &hash, true).unwrap()
}

fn forecast_of(run: &PipelineRun) -> (f64, TradingSignal) {
    match &run.outcome {
        RunOutcome::Forecast {
            predicted_return,
            signal,
            ..
        } => (*predicted_return, *signal),
        RunOutcome::FeaturesOnly { reason } => {
            panic!("expected a forecast, got features-only: {reason}")
        }
    }
}

#[test]
fn full_run_is_deterministic() {
    let config = test_config();
    let a = run_synthetic(&config);
    let b = run_synthetic(&config);

    let (pred_a, signal_a) = forecast_of(&a);
    let (pred_b, signal_b) = forecast_of(&b);
    assert_eq!(
        pred_a.to_bits(),
        pred_b.to_bits(),
        "identical inputs must give bit-identical predictions"
    );
    assert_eq!(signal_a, signal_b);
    assert_eq!(a.outcome, b.outcome);
    assert_eq!(a.attribution, b.attribution);
    assert_eq!(a.dataset_hash, b.dataset_hash);
    assert_eq!(a.run_id, b.run_id);
}

#[test]
fn attribution_reconstructs_prediction() {
    let run = run_synthetic(&test_config());
    let (predicted, _) = forecast_of(&run);

    match &run.attribution {
        AttributionOutcome::Ready(att) => {
            let gap = (att.reconstructed() - predicted).abs();
            assert!(gap < 1e-6, "additivity gap {gap}");
            assert_eq!(att.contributions.len(), run.table.columns().len());
        }
        AttributionOutcome::Unavailable { reason } => panic!("attribution unavailable: {reason}"),
    }
}

#[test]
fn leafwise_backend_is_deterministic_too() {
    let config = ForecastConfig {
        model: GbtParams {
            backend: Backend::Leafwise,
            n_trees: 30,
            ..GbtParams::default()
        },
        ..test_config()
    };
    let a = run_synthetic(&config);
    let b = run_synthetic(&config);
    let (pred_a, _) = forecast_of(&a);
    let (pred_b, _) = forecast_of(&b);
    assert_eq!(pred_a.to_bits(), pred_b.to_bits());
    assert!(pred_a.is_finite());
}

#[test]
fn offline_run_serves_from_seeded_cache() {
    // No cross basket here: the cross adapter caches per-symbol bars,
    // and this test seeds the four single-payload sources directly.
    let config = ForecastConfig {
        cross_assets: vec![],
        ..test_config()
    };
    let inputs = synthetic_inputs(&config, end_date());

    let dir = temp_dir("offline_cache");
    let cache = FetchCache::new(&dir);

    let price_key = CacheKey::new(
        "price",
        format!("ticker={}&range={}", config.ticker, config.range),
    );
    cache
        .store_bars(&price_key, &inputs.bars, PRICE_TTL_SECS)
        .unwrap();
    cache
        .store_series(
            &CacheKey::new("activity", format!("repo={}", config.activity_repo)),
            &inputs.activity,
            ACTIVITY_TTL_SECS,
        )
        .unwrap();
    cache
        .store_series(
            &CacheKey::new(
                "hashrate",
                format!("timespan={}", config.hashrate_timespan),
            ),
            &inputs.hashrate,
            HASHRATE_TTL_SECS,
        )
        .unwrap();
    cache
        .store_series(
            &CacheKey::new("sentiment", format!("limit={}", config.sentiment_limit)),
            &inputs.sentiment,
            SENTIMENT_TTL_SECS,
        )
        .unwrap();

    let opts = RunOptions {
        offline: true,
        synthetic: false,
    };
    let cached_run = run_forecast(&config, &cache, &opts).unwrap();

    // The cache round-trip preserves payloads exactly, so the offline
    // run must match a direct run on the original inputs.
    let hash = compute_dataset_hash(&inputs);
    let direct_run = forecast_from_inputs(&config, inputs, &hash, false).unwrap();

    assert!(!cached_run.has_synthetic);
    assert_eq!(cached_run.table.len(), 101);
    assert_eq!(cached_run.dataset_hash, direct_run.dataset_hash);
    let (cached_pred, _) = forecast_of(&cached_run);
    let (direct_pred, _) = forecast_of(&direct_run);
    assert_eq!(cached_pred.to_bits(), direct_pred.to_bits());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn synthetic_entry_point_tags_the_result() {
    let dir = temp_dir("synthetic_entry");
    let cache = FetchCache::new(&dir);
    let opts = RunOptions {
        offline: false,
        synthetic: true,
    };

    let run = run_forecast(&test_config(), &cache, &opts).unwrap();
    assert!(run.has_synthetic);
    let (pred, _) = forecast_of(&run);
    assert!(pred.is_finite());
    assert!(!run.dataset_hash.is_empty());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn fused_table_round_trips_through_csv() {
    let run = run_synthetic(&test_config());

    let csv = export_features_csv(&run.table).unwrap();
    let back = import_features_csv(&csv).unwrap();

    assert_eq!(back.columns(), run.table.columns());
    assert_eq!(back.dates(), run.table.dates());
    assert_eq!(back.len(), run.table.len());
    for (a, b) in run.table.rows().iter().zip(back.rows()) {
        for (x, y) in a.iter().zip(b) {
            assert_eq!(x.to_bits(), y.to_bits(), "CSV round-trip must be bit-exact");
        }
    }
}

#[test]
fn artifact_bundle_round_trips() {
    let run = run_synthetic(&test_config());
    let dir = temp_dir("artifacts");

    let run_dir = save_artifacts(&run, &dir).unwrap();
    assert_eq!(run_dir, dir.join(&run.run_id));
    assert!(run_dir.join("manifest.json").exists());
    assert!(run_dir.join("features.csv").exists());
    assert!(run_dir.join("report.md").exists());

    let reloaded = load_manifest(&run_dir).unwrap();
    assert_eq!(reloaded, run.manifest());

    let (_, signal) = forecast_of(&run);
    let report = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(report.contains(&signal.to_string()));
    assert!(report.contains("SYNTHETIC"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn features_only_run_still_exports() {
    // 100 days fuse down to a single row: training is skipped but the
    // run completes and its table lands in the bundle.
    let config = ForecastConfig {
        range: "100d".into(),
        ..test_config()
    };
    let inputs = synthetic_inputs(&config, end_date());
    let hash = compute_dataset_hash(&inputs);
    let run = forecast_from_inputs(&config, inputs, &hash, true).unwrap();

    assert_eq!(run.table.len(), 1);
    assert!(matches!(run.outcome, RunOutcome::FeaturesOnly { .. }));

    let dir = temp_dir("features_only");
    let run_dir = save_artifacts(&run, &dir).unwrap();

    let manifest = load_manifest(&run_dir).unwrap();
    assert!(matches!(manifest.outcome, RunOutcome::FeaturesOnly { .. }));
    assert_eq!(manifest.table_rows, 1);

    let csv = std::fs::read_to_string(run_dir.join("features.csv")).unwrap();
    // header plus exactly one data row
    assert_eq!(csv.lines().count(), 2);

    let report = std::fs::read_to_string(run_dir.join("report.md")).unwrap();
    assert!(report.contains("No forecast"));

    let _ = std::fs::remove_dir_all(&dir);
}
