//! Latest-row forecasting.
//!
//! Pulls the model's features out of the final table row by name, so a
//! model only ever sees inputs in the order it was trained on. A table
//! that cannot supply a feature is a hard error, not a silent zero.

use thiserror::Error;

use super::GbtModel;
use crate::domain::{FeatureTable, Prediction};
use crate::signal::{classify, TradingSignal};

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("feature table does not carry model feature `{0}`")]
    FeatureMismatch(String),

    #[error("feature table has no rows to predict from")]
    EmptyTable,
}

/// One forecast: the predicted forward return, its signal, and the
/// model inputs it was made from (in model feature order).
#[derive(Debug, Clone)]
pub struct Forecast {
    pub prediction: Prediction,
    pub signal: TradingSignal,
    pub features: Vec<(String, f64)>,
}

impl Forecast {
    /// The bare feature vector, for attribution.
    pub fn feature_vector(&self) -> Vec<f64> {
        self.features.iter().map(|(_, v)| *v).collect()
    }
}

/// Forecast from the final row of a fused table.
pub fn predict_latest(
    model: &GbtModel,
    table: &FeatureTable,
    horizon: usize,
) -> Result<Forecast, PredictError> {
    let row = table.last_row().ok_or(PredictError::EmptyTable)?;

    let mut features = Vec::with_capacity(model.feature_names().len());
    for name in model.feature_names() {
        let idx = table
            .column_index(name)
            .ok_or_else(|| PredictError::FeatureMismatch(name.clone()))?;
        features.push((name.clone(), row.values[idx]));
    }

    let x: Vec<f64> = features.iter().map(|(_, v)| *v).collect();
    let value = model.predict_row(&x);

    Ok(Forecast {
        prediction: Prediction::new(value, horizon, row.date),
        signal: classify(value),
        features,
    })
}
