//! Domain types for the forecast pipeline.

pub mod ohlcv;
pub mod prediction;
pub mod series;
pub mod table;

pub use ohlcv::{canonicalize_bars, OhlcvBar};
pub use prediction::Prediction;
pub use series::{SeriesPoint, TimeSeries};
pub use table::{FeatureRow, FeatureTable, TableError};
