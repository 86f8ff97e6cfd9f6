//! BtcLab Core — source adapters, feature fusion, model, attribution.
//!
//! This crate contains the heart of the forecasting pipeline:
//! - Domain types (OHLCV bars, time series, the fused feature table)
//! - Source adapters (price, commit activity, hash rate, sentiment,
//!   cross-asset markets) behind a TTL parquet cache
//! - Feature fusion onto the primary price calendar
//! - Gradient-boosted trees with two interchangeable growth backends
//! - Signal classification over the predicted forward return
//! - Exact additive attribution of every forecast

pub mod data;
pub mod domain;
pub mod explain;
pub mod fusion;
pub mod indicators;
pub mod model;
pub mod schema;
pub mod signal;
