//! Forecast runner — wires together gathering, fusion, training, and
//! attribution.
//!
//! Two entry points:
//! - `run_forecast()`: gathers sources (or generates synthetic ones),
//!   then runs the pipeline. Used by the CLI.
//! - `forecast_from_inputs()`: takes pre-built source payloads, no I/O.
//!   Used by tests and anything that already holds the data.
//!
//! Failure surface: fusion errors abort the run with no partial output.
//! Training failure does not — the run completes with a features-only
//! outcome so the fused table can still be exported. Attribution never
//! blocks a forecast; when it cannot be computed the run carries an
//! explicit unavailable state instead.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use btclab_core::data::{FetchCache, FetchMode};
use btclab_core::domain::FeatureTable;
use btclab_core::explain::{Attribution, TreeExplainer};
use btclab_core::fusion::{fuse, FusionError, FusionInputs};
use btclab_core::model::{predict_latest, train, PredictError};
use btclab_core::signal::TradingSignal;

use crate::config::{ConfigError, ForecastConfig, RunId};
use crate::sources::{compute_dataset_hash, gather_sources};
use crate::synthetic::synthetic_inputs;

/// Errors that abort a run outright.
///
/// Training and attribution failures are absent on purpose: they
/// degrade the [`PipelineRun`] instead of failing it.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("fusion error: {0}")]
    Fusion(#[from] FusionError),
    /// Feature ordering drifted between training and inference. This is
    /// a broken internal contract, not a data condition.
    #[error("prediction error: {0}")]
    Predict(#[from] PredictError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Default schema version for serde deserialization of older JSON
/// without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Options controlling how a run acquires its data.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// If true, never make network requests; serve from cache only.
    pub offline: bool,
    /// If true, bypass fetching entirely and generate synthetic
    /// payloads. The result is tagged.
    pub synthetic: bool,
}

/// What a completed run produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Model trained; a forecast and signal are available.
    Forecast {
        /// Date of the feature row the forecast was computed from.
        as_of: NaiveDate,
        predicted_return: f64,
        signal: TradingSignal,
        train_rows: usize,
    },
    /// Training was skipped, typically for lack of usable rows. The
    /// fused table is still exported for inspection.
    FeaturesOnly { reason: String },
}

/// Attribution for the run's forecast, or the reason there is none.
///
/// Held in memory only: it is cheap and exact to recompute, so nothing
/// persists it raw — the markdown report renders it instead.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributionOutcome {
    Ready(Attribution),
    Unavailable { reason: String },
}

/// One immutable forecast run, keyed by its run ID.
///
/// Changing any config field (horizon, backend, basket, ...) yields a
/// distinct run ID and therefore a fresh run; results are never mutated
/// in place.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: RunId,
    pub config: ForecastConfig,
    pub generated_at: NaiveDateTime,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub table: FeatureTable,
    pub outcome: RunOutcome,
    pub attribution: AttributionOutcome,
}

impl PipelineRun {
    /// The serializable projection written to `manifest.json`.
    ///
    /// Attribution is deliberately excluded; see [`AttributionOutcome`].
    pub fn manifest(&self) -> Manifest {
        Manifest {
            schema_version: SCHEMA_VERSION,
            run_id: self.run_id.clone(),
            config: self.config.clone(),
            generated_at: self.generated_at,
            dataset_hash: self.dataset_hash.clone(),
            has_synthetic: self.has_synthetic,
            table_rows: self.table.len(),
            feature_count: self.table.columns().len(),
            outcome: self.outcome.clone(),
        }
    }
}

/// The durable record of a run: identity, config, and outcome.
///
/// The feature table travels separately as `features.csv`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub config: ForecastConfig,
    pub generated_at: NaiveDateTime,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub table_rows: usize,
    pub feature_count: usize,
    pub outcome: RunOutcome,
}

/// Run a full forecast from a config (gathers data through the cache).
///
/// This is the high-level entry point used by the CLI. For pre-built
/// payloads, use [`forecast_from_inputs`] instead.
pub fn run_forecast(
    config: &ForecastConfig,
    cache: &FetchCache,
    opts: &RunOptions,
) -> Result<PipelineRun, RunError> {
    config.validate()?;

    let (inputs, dataset_hash, has_synthetic) = if opts.synthetic {
        warn!("generating synthetic data; result will be tagged as synthetic");
        let inputs = synthetic_inputs(config, chrono::Local::now().date_naive());
        let hash = compute_dataset_hash(&inputs);
        (inputs, hash, true)
    } else {
        let mode = if opts.offline {
            FetchMode::Offline
        } else {
            FetchMode::Online
        };
        let gathered = gather_sources(config, cache, mode);
        (gathered.inputs, gathered.dataset_hash, false)
    };

    forecast_from_inputs(config, inputs, &dataset_hash, has_synthetic)
}

/// Run the pipeline on pre-built source payloads — no I/O.
pub fn forecast_from_inputs(
    config: &ForecastConfig,
    inputs: FusionInputs,
    dataset_hash: &str,
    has_synthetic: bool,
) -> Result<PipelineRun, RunError> {
    let table = fuse(inputs)?;
    let labels = config.cross_labels();

    let (outcome, attribution) = match train(&table, &labels, config.horizon, &config.model) {
        Ok(trained) => {
            let forecast = predict_latest(&trained.model, &table, config.horizon)?;
            let attribution =
                match TreeExplainer::new(&trained.model).explain(&forecast.feature_vector()) {
                    Ok(att) => AttributionOutcome::Ready(att),
                    Err(err) => {
                        warn!(error = %err, "attribution unavailable; forecast served without it");
                        AttributionOutcome::Unavailable {
                            reason: err.to_string(),
                        }
                    }
                };

            info!(
                ticker = %config.ticker,
                horizon = config.horizon,
                rows = table.len(),
                train_rows = trained.train_rows,
                predicted_return = forecast.prediction.value,
                signal = %forecast.signal,
                "forecast complete"
            );

            (
                RunOutcome::Forecast {
                    as_of: forecast.prediction.as_of,
                    predicted_return: forecast.prediction.value,
                    signal: forecast.signal,
                    train_rows: trained.train_rows,
                },
                attribution,
            )
        }
        Err(err) => {
            warn!(
                error = %err,
                rows = table.len(),
                "training skipped; run carries features only"
            );
            (
                RunOutcome::FeaturesOnly {
                    reason: err.to_string(),
                },
                AttributionOutcome::Unavailable {
                    reason: "no trained model".into(),
                },
            )
        }
    };

    Ok(PipelineRun {
        run_id: config.run_id(),
        config: config.clone(),
        generated_at: chrono::Local::now().naive_local(),
        dataset_hash: dataset_hash.to_string(),
        has_synthetic,
        table,
        outcome,
        attribution,
    })
}
