//! Feature fusion: one table out of many calendars.
//!
//! The primary price series owns the row index. Auxiliary series are
//! as-of joined onto it (most recent observation at or before each
//! date), derived features are computed on the aligned columns, and
//! rows containing any non-finite value are dropped at the end. What
//! remains is a rectangular, all-finite [`FeatureTable`].
//!
//! A source that produced nothing at all gets its columns zero-filled
//! instead of silently emptying the table; a source that produced data
//! which simply does not overlap the primary index contributes NaN and
//! its rows fall to the drop.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

pub mod align;

pub use align::join_forward_fill;

use crate::domain::{
    canonicalize_bars, FeatureTable, OhlcvBar, SeriesPoint, TableError, TimeSeries,
};
use crate::indicators::{ewma_span, log_returns, rolling_mean, rolling_std, rolling_zscore};
use crate::schema::{self, table_columns};

/// Short and long moving-average windows over the close.
pub const SHORT_MA_WINDOW: usize = 20;
pub const LONG_MA_WINDOW: usize = 100;

/// Rolling window for annualization-free return volatility.
pub const VOLATILITY_WINDOW: usize = 20;

/// EWMA span for the commit-activity smoothing.
pub const ACTIVITY_EWMA_SPAN: usize = 7;

/// Rolling window for the hash-rate z-score.
pub const HASHRATE_ZSCORE_WINDOW: usize = 30;

#[derive(Debug, Error)]
pub enum FusionError {
    #[error("no price data available for the primary ticker")]
    DataUnavailable,

    #[error("feature table is empty after dropping incomplete rows ({rows_before} before the drop)")]
    EmptyFeatureTable { rows_before: usize },

    #[error(transparent)]
    Table(#[from] TableError),
}

/// Raw source payloads, exactly as the adapters hand them over.
/// Cross-asset series are `(label, log returns)` pairs in basket order.
#[derive(Debug, Default)]
pub struct FusionInputs {
    pub bars: Vec<OhlcvBar>,
    pub activity: Vec<SeriesPoint>,
    pub hashrate: Vec<SeriesPoint>,
    pub sentiment: Vec<SeriesPoint>,
    pub cross: Vec<(String, Vec<SeriesPoint>)>,
}

/// Fuse all sources into one feature table.
pub fn fuse(inputs: FusionInputs) -> Result<FeatureTable, FusionError> {
    let bars = canonicalize_bars(inputs.bars);
    if bars.is_empty() {
        return Err(FusionError::DataUnavailable);
    }

    let index: Vec<NaiveDate> = bars.iter().map(|b| b.date).collect();
    let n = index.len();

    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    let returns = log_returns(&closes);
    let ma_short = rolling_mean(&closes, SHORT_MA_WINDOW);
    let ma_long = rolling_mean(&closes, LONG_MA_WINDOW);
    let vol_scale = (VOLATILITY_WINDOW as f64).sqrt();
    let volatility: Vec<f64> = rolling_std(&returns, VOLATILITY_WINDOW)
        .into_iter()
        .map(|s| s * vol_scale)
        .collect();

    let (activity, activity_ewma) = if inputs.activity.is_empty() {
        warn_zero_fill("activity", &[schema::COL_ACTIVITY, schema::COL_ACTIVITY_EWMA]);
        (vec![0.0; n], vec![0.0; n])
    } else {
        let aligned = aligned_column(&index, schema::COL_ACTIVITY, inputs.activity);
        let ewma = ewma_span(&aligned, ACTIVITY_EWMA_SPAN);
        (aligned, ewma)
    };

    let (hashrate, hashrate_zscore) = if inputs.hashrate.is_empty() {
        warn_zero_fill("hashrate", &[schema::COL_HASHRATE, schema::COL_HASHRATE_ZSCORE]);
        (vec![0.0; n], vec![0.0; n])
    } else {
        let aligned = aligned_column(&index, schema::COL_HASHRATE, inputs.hashrate);
        let zscore = rolling_zscore(&aligned, HASHRATE_ZSCORE_WINDOW);
        (aligned, zscore)
    };

    let sentiment = if inputs.sentiment.is_empty() {
        warn_zero_fill("sentiment", &[schema::COL_SENTIMENT]);
        vec![0.0; n]
    } else {
        aligned_column(&index, schema::COL_SENTIMENT, inputs.sentiment)
    };

    let cross_labels: Vec<String> = inputs.cross.iter().map(|(l, _)| l.clone()).collect();
    let cross_cols: Vec<Vec<f64>> = inputs
        .cross
        .into_iter()
        .map(|(label, points)| {
            if points.is_empty() {
                warn_zero_fill(&label, &[&schema::cross_column(&label)]);
                vec![0.0; n]
            } else {
                aligned_column(&index, &label, points)
            }
        })
        .collect();

    // Canonical column order; must stay in sync with `table_columns`.
    let columns = table_columns(&cross_labels);
    let mut by_column: Vec<Vec<f64>> = vec![
        opens, highs, lows, closes, volumes, returns, ma_short, ma_long, volatility, activity,
        hashrate, sentiment,
    ];
    by_column.extend(cross_cols);
    by_column.push(activity_ewma);
    by_column.push(hashrate_zscore);
    debug_assert_eq!(by_column.len(), columns.len());

    // Drop every row touched by a non-finite value.
    let mut dates = Vec::with_capacity(n);
    let mut rows = Vec::with_capacity(n);
    for i in 0..n {
        if by_column.iter().all(|col| col[i].is_finite()) {
            dates.push(index[i]);
            rows.push(by_column.iter().map(|col| col[i]).collect());
        }
    }

    if rows.is_empty() {
        return Err(FusionError::EmptyFeatureTable { rows_before: n });
    }
    debug!(
        rows = rows.len(),
        dropped = n - rows.len(),
        columns = columns.len(),
        "fused feature table"
    );
    Ok(FeatureTable::new(dates, columns, rows)?)
}

fn aligned_column(index: &[NaiveDate], name: &str, points: Vec<SeriesPoint>) -> Vec<f64> {
    join_forward_fill(index, &TimeSeries::new(name, points))
}

fn warn_zero_fill(source: &str, columns: &[&str]) {
    warn!(source, ?columns, "source produced no data; zero-filling its columns");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn make_bars(n: usize) -> Vec<OhlcvBar> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64) * 0.5 + ((i as f64) * 0.7).sin() * 2.0;
                OhlcvBar {
                    date: start() + Duration::days(i as i64),
                    open: close * 0.999,
                    high: close * 1.01,
                    low: close * 0.99,
                    close,
                    volume: 1000.0 + i as f64,
                }
            })
            .collect()
    }

    fn daily_points(n: usize, f: impl Fn(usize) -> f64) -> Vec<SeriesPoint> {
        (0..n)
            .map(|i| SeriesPoint {
                date: start() + Duration::days(i as i64),
                value: f(i),
            })
            .collect()
    }

    #[test]
    fn empty_primary_is_unavailable() {
        let err = fuse(FusionInputs::default()).unwrap_err();
        assert!(matches!(err, FusionError::DataUnavailable));
    }

    #[test]
    fn primary_only_warmup_drops_long_ma_prefix() {
        let inputs = FusionInputs {
            bars: make_bars(150),
            cross: vec![("sp500".into(), Vec::new())],
            ..FusionInputs::default()
        };
        let table = fuse(inputs).unwrap();

        // the long moving average needs 100 closes, so the first
        // complete row sits at source index 99
        assert_eq!(table.len(), 51);
        assert_eq!(table.dates()[0], start() + Duration::days(99));
        assert_eq!(
            table.columns(),
            table_columns(&["sp500".to_string()]).as_slice()
        );

        // zero-filled source columns really are zero
        assert!(table.column("activity").unwrap().iter().all(|&v| v == 0.0));
        assert!(table
            .column("sp500_return")
            .unwrap()
            .iter()
            .all(|&v| v == 0.0));
        assert!(table
            .column("hashrate_zscore")
            .unwrap()
            .iter()
            .all(|&v| v == 0.0));
    }

    #[test]
    fn single_bar_table_is_empty() {
        let inputs = FusionInputs {
            bars: make_bars(1),
            ..FusionInputs::default()
        };
        let err = fuse(inputs).unwrap_err();
        assert!(matches!(
            err,
            FusionError::EmptyFeatureTable { rows_before: 1 }
        ));
    }

    #[test]
    fn short_primary_cannot_fill_long_ma() {
        let inputs = FusionInputs {
            bars: make_bars(50),
            ..FusionInputs::default()
        };
        let err = fuse(inputs).unwrap_err();
        assert!(matches!(
            err,
            FusionError::EmptyFeatureTable { rows_before: 50 }
        ));
    }

    #[test]
    fn sentiment_forward_fills_onto_index() {
        let mut inputs = FusionInputs {
            bars: make_bars(120),
            ..FusionInputs::default()
        };
        // one observation before the surviving window, another inside it
        inputs.sentiment = vec![
            SeriesPoint {
                date: start() + Duration::days(10),
                value: 40.0,
            },
            SeriesPoint {
                date: start() + Duration::days(110),
                value: 75.0,
            },
        ];
        let table = fuse(inputs).unwrap();

        let sentiment = table.column("sentiment").unwrap();
        let dates = table.dates();
        for (date, value) in dates.iter().zip(&sentiment) {
            let expected = if *date < start() + Duration::days(110) {
                40.0
            } else {
                75.0
            };
            assert_eq!(*value, expected, "at {date}");
        }
    }

    #[test]
    fn late_auxiliary_delays_the_first_surviving_row() {
        // sentiment covers only the last 30 of 150 days, so the first
        // complete row moves from the ma_100 boundary (99) out to 120
        let inputs = FusionInputs {
            bars: make_bars(150),
            sentiment: (120..150)
                .map(|i| SeriesPoint {
                    date: start() + Duration::days(i),
                    value: 50.0,
                })
                .collect(),
            ..FusionInputs::default()
        };
        let table = fuse(inputs).unwrap();

        assert_eq!(table.len(), 30);
        assert_eq!(table.dates()[0], start() + Duration::days(120));
    }

    #[test]
    fn non_overlapping_source_empties_the_table() {
        // sentiment exists but starts after the primary range ends, so
        // its column is NaN everywhere and every row drops
        let inputs = FusionInputs {
            bars: make_bars(150),
            sentiment: daily_points(10, |_| 50.0)
                .into_iter()
                .map(|mut p| {
                    p.date += Duration::days(400);
                    p
                })
                .collect(),
            ..FusionInputs::default()
        };
        let err = fuse(inputs).unwrap_err();
        assert!(matches!(
            err,
            FusionError::EmptyFeatureTable { rows_before: 150 }
        ));
    }

    #[test]
    fn derived_columns_present_and_finite() {
        let inputs = FusionInputs {
            bars: make_bars(150),
            activity: daily_points(150, |i| (i % 7) as f64),
            hashrate: daily_points(150, |i| 500.0 + i as f64),
            sentiment: daily_points(150, |_| 50.0),
            cross: vec![("eth".into(), daily_points(150, |i| 0.001 * i as f64))],
        };
        let table = fuse(inputs).unwrap();

        for name in ["return", "ma_20", "ma_100", "volatility", "activity_ewma", "hashrate_zscore", "eth_return"] {
            let col = table.column(name).unwrap();
            assert!(col.iter().all(|v| v.is_finite()), "{name} has non-finite values");
        }
        assert_eq!(table.len(), 51);
    }

    #[test]
    fn volatility_is_scaled_rolling_std() {
        let bars = make_bars(150);
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let inputs = FusionInputs {
            bars,
            ..FusionInputs::default()
        };
        let table = fuse(inputs).unwrap();

        let returns = log_returns(&closes);
        let expected = rolling_std(&returns, VOLATILITY_WINDOW);
        let vol = table.column("volatility").unwrap();
        // compare the first surviving row (source index 99)
        crate::indicators::assert_approx(
            vol[0],
            expected[99] * (VOLATILITY_WINDOW as f64).sqrt(),
            1e-12,
        );
    }
}
