//! Training orchestration: forward-return target and train/infer split.
//!
//! The target at table row `t` is the one-day log return at row
//! `t + horizon`, so the last `horizon` rows have no target and are
//! excluded from training. The final table row is kept aside as the
//! inference row the forecast is made from.

use thiserror::Error;
use tracing::debug;

use super::{GbtModel, GbtParams};
use crate::domain::{FeatureRow, FeatureTable, TableError};
use crate::schema::{self, model_features};

pub const MIN_HORIZON: usize = 1;
pub const MAX_HORIZON: usize = 30;

/// A single training row cannot grow a split.
pub const MIN_TRAIN_ROWS: usize = 2;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("forecast horizon must be {MIN_HORIZON}..={MAX_HORIZON} days, got {0}")]
    InvalidHorizon(usize),

    #[error(
        "not enough feature rows to train: {rows} rows leave {usable} \
         with a {horizon}-day forward target"
    )]
    InsufficientData {
        rows: usize,
        usable: usize,
        horizon: usize,
    },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// A fitted model plus the split bookkeeping around it.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub model: GbtModel,
    pub train_rows: usize,
    /// The final table row, which training never saw as a target.
    pub inference_row: FeatureRow,
}

/// Train a forecasting model on a fused feature table.
pub fn train(
    table: &FeatureTable,
    cross_labels: &[String],
    horizon: usize,
    params: &GbtParams,
) -> Result<TrainOutput, TrainError> {
    if !(MIN_HORIZON..=MAX_HORIZON).contains(&horizon) {
        return Err(TrainError::InvalidHorizon(horizon));
    }

    let rows = table.len();
    let usable = rows.saturating_sub(horizon);
    if usable < MIN_TRAIN_ROWS {
        return Err(TrainError::InsufficientData {
            rows,
            usable,
            horizon,
        });
    }

    let feature_names = model_features(cross_labels);
    let matrix = table.select(&feature_names)?;
    let returns = table.column(schema::COL_RETURN)?;

    let data: Vec<Vec<f64>> = matrix[..usable].to_vec();
    let targets: Vec<f64> = (0..usable).map(|t| returns[t + horizon]).collect();

    debug!(
        rows,
        train_rows = usable,
        horizon,
        backend = ?params.backend,
        "fitting forecast model"
    );
    let model = GbtModel::fit(&data, &targets, feature_names, params);

    let inference_row = table.last_row().ok_or(TrainError::InsufficientData {
        rows: 0,
        usable: 0,
        horizon,
    })?;

    Ok(TrainOutput {
        model,
        train_rows: usable,
        inference_row,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn make_table(n: usize) -> FeatureTable {
        let columns = schema::table_columns(&[]);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..n).map(|i| start + Duration::days(i as i64)).collect();
        let rows = (0..n)
            .map(|i| {
                (0..columns.len())
                    .map(|j| {
                        let x = (i + 1) as f64 * 0.01 * (j + 2) as f64;
                        x.sin() * 0.02 + x * 0.001
                    })
                    .collect()
            })
            .collect();
        FeatureTable::new(dates, columns, rows).unwrap()
    }

    #[test]
    fn horizon_bounds_are_enforced() {
        let table = make_table(40);
        let params = GbtParams::default();
        assert!(matches!(
            train(&table, &[], 0, &params),
            Err(TrainError::InvalidHorizon(0))
        ));
        assert!(matches!(
            train(&table, &[], 31, &params),
            Err(TrainError::InvalidHorizon(31))
        ));
        assert!(train(&table, &[], 30, &params).is_ok());
    }

    #[test]
    fn single_usable_row_is_insufficient() {
        let table = make_table(6);
        let err = train(&table, &[], 5, &GbtParams::default()).unwrap_err();
        assert!(matches!(
            err,
            TrainError::InsufficientData {
                rows: 6,
                usable: 1,
                horizon: 5
            }
        ));
    }

    #[test]
    fn split_excludes_targetless_tail() {
        let table = make_table(40);
        let out = train(&table, &[], 7, &GbtParams::default()).unwrap();
        assert_eq!(out.train_rows, 33);
        assert_eq!(
            out.inference_row.date,
            *table.dates().last().unwrap()
        );
        assert_eq!(out.model.feature_names(), model_features(&[]).as_slice());
    }

    #[test]
    fn missing_feature_column_is_a_table_error() {
        // a table that lacks the cross-asset column the labels promise
        let table = make_table(40);
        let labels = vec!["sp500".to_string()];
        let err = train(&table, &labels, 3, &GbtParams::default()).unwrap_err();
        assert!(matches!(
            err,
            TrainError::Table(TableError::MissingColumn(_))
        ));
    }

    #[test]
    fn training_is_deterministic() {
        let table = make_table(60);
        let params = GbtParams::default();
        let a = train(&table, &[], 5, &params).unwrap();
        let b = train(&table, &[], 5, &params).unwrap();
        assert_eq!(a.model, b.model);
    }
}
