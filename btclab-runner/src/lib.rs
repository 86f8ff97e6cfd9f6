//! BtcLab Runner — forecast orchestration, artifacts, reports.
//!
//! This crate builds on `btclab-core` to provide:
//! - Serializable run configuration with content-addressed run IDs
//! - Parallel source gathering through the fetch cache
//! - Deterministic synthetic payloads for offline development
//! - The end-to-end forecast pipeline (fuse, train, predict, explain)
//! - JSON/CSV/Markdown artifact export with schema versioning

pub mod config;
pub mod export;
pub mod runner;
pub mod sources;
pub mod synthetic;

pub use config::{ConfigError, ForecastConfig, RunId};
pub use export::{
    export_features_csv, export_json, generate_report, import_features_csv, import_json,
    load_manifest, save_artifacts,
};
pub use runner::{
    forecast_from_inputs, run_forecast, AttributionOutcome, Manifest, PipelineRun, RunError,
    RunOptions, RunOutcome, SCHEMA_VERSION,
};
pub use sources::{compute_dataset_hash, gather_sources, GatheredData};
pub use synthetic::{range_days, synthetic_inputs};
