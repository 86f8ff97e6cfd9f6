//! Serializable forecast run configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use btclab_core::data::{default_cross_assets, CrossAsset};
use btclab_core::model::{GbtParams, MAX_HORIZON, MIN_HORIZON};

/// Unique identifier for a forecast run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("horizon {0} is out of range ({MIN_HORIZON}..={MAX_HORIZON})")]
    InvalidHorizon(usize),
    #[error("activity repo '{0}' is not of the form owner/name")]
    InvalidRepo(String),
    #[error("config field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("cross-asset label '{0}' appears more than once")]
    DuplicateCrossLabel(String),
    #[error("invalid model parameters: {0}")]
    InvalidModel(String),
}

/// Serializable configuration for a single forecast run.
///
/// This struct captures all parameters needed to reproduce a forecast:
/// - Primary asset and history range
/// - Auxiliary source parameters (repo, timespan, sentiment depth)
/// - Cross-asset basket
/// - Forecast horizon and model parameters
///
/// Operational knobs (cache directory, offline/synthetic mode) live in
/// [`crate::runner::RunOptions`] and do not affect the run identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForecastConfig {
    /// Primary ticker on the chart API (e.g. "BTC-USD").
    #[serde(default = "default_ticker")]
    pub ticker: String,

    /// Relative history range for price and cross-asset fetches
    /// (e.g. "2y", "6mo").
    #[serde(default = "default_range")]
    pub range: String,

    /// GitHub repository for the developer activity source, "owner/name".
    #[serde(default = "default_activity_repo")]
    pub activity_repo: String,

    /// Timespan parameter for the network hash rate chart.
    #[serde(default = "default_hashrate_timespan")]
    pub hashrate_timespan: String,

    /// Number of daily sentiment readings to request.
    #[serde(default = "default_sentiment_limit")]
    pub sentiment_limit: u32,

    /// Cross-asset basket joined as auxiliary return columns.
    #[serde(default = "default_cross_assets")]
    pub cross_assets: Vec<CrossAsset>,

    /// Forward-return horizon in days.
    #[serde(default = "default_horizon")]
    pub horizon: usize,

    /// Gradient boosting parameters.
    #[serde(default)]
    pub model: GbtParams,
}

fn default_ticker() -> String {
    "BTC-USD".to_string()
}

fn default_range() -> String {
    "2y".to_string()
}

fn default_activity_repo() -> String {
    "bitcoin/bitcoin".to_string()
}

fn default_hashrate_timespan() -> String {
    "2years".to_string()
}

fn default_sentiment_limit() -> u32 {
    730
}

fn default_horizon() -> usize {
    7
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            ticker: default_ticker(),
            range: default_range(),
            activity_repo: default_activity_repo(),
            hashrate_timespan: default_hashrate_timespan(),
            sentiment_limit: default_sentiment_limit(),
            cross_assets: default_cross_assets(),
            horizon: default_horizon(),
            model: GbtParams::default(),
        }
    }
}

impl ForecastConfig {
    /// Parse a config from TOML and validate it.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check field-level constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ticker.trim().is_empty() {
            return Err(ConfigError::EmptyField("ticker"));
        }
        if self.range.trim().is_empty() {
            return Err(ConfigError::EmptyField("range"));
        }
        if self.hashrate_timespan.trim().is_empty() {
            return Err(ConfigError::EmptyField("hashrate_timespan"));
        }
        if self.sentiment_limit == 0 {
            return Err(ConfigError::EmptyField("sentiment_limit"));
        }
        let repo_parts: Vec<&str> = self.activity_repo.split('/').collect();
        if repo_parts.len() != 2 || repo_parts.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidRepo(self.activity_repo.clone()));
        }
        if !(MIN_HORIZON..=MAX_HORIZON).contains(&self.horizon) {
            return Err(ConfigError::InvalidHorizon(self.horizon));
        }
        for (i, asset) in self.cross_assets.iter().enumerate() {
            if asset.symbol.trim().is_empty() || asset.label.trim().is_empty() {
                return Err(ConfigError::EmptyField("cross_assets"));
            }
            if self.cross_assets[..i].iter().any(|a| a.label == asset.label) {
                return Err(ConfigError::DuplicateCrossLabel(asset.label.clone()));
            }
        }
        if self.model.n_trees == 0 {
            return Err(ConfigError::InvalidModel("n_trees must be at least 1".into()));
        }
        if !self.model.learning_rate.is_finite() || self.model.learning_rate <= 0.0 {
            return Err(ConfigError::InvalidModel(format!(
                "learning_rate {} must be finite and positive",
                self.model.learning_rate
            )));
        }
        Ok(())
    }

    /// Labels of the cross-asset basket, in basket order.
    pub fn cross_labels(&self) -> Vec<String> {
        self.cross_assets.iter().map(|a| a.label.clone()).collect()
    }

    /// Computes a deterministic hash ID for this configuration.
    ///
    /// Two runs with identical configs share a RunId, so their
    /// artifacts land in comparable locations.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ForecastConfig serialization failed");
        let hash = blake3::hash(json.as_bytes());
        format!("{}", hash.to_hex())
    }
}
