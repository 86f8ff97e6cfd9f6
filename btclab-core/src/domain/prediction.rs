//! Prediction — the scalar output of a trained model.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A forward log-return forecast at a fixed horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted log return over the horizon.
    pub value: f64,
    /// Forecast horizon in days.
    pub horizon: usize,
    /// Date of the feature row the forecast was made from.
    pub as_of: NaiveDate,
    /// Wall-clock generation time.
    pub generated_at: NaiveDateTime,
}

impl Prediction {
    pub fn new(value: f64, horizon: usize, as_of: NaiveDate) -> Self {
        Self {
            value,
            horizon,
            as_of,
            generated_at: chrono::Local::now().naive_local(),
        }
    }
}
