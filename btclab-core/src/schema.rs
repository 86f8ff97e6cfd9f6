//! Column contract — the exact names and ordering shared by fusion,
//! training, and export.
//!
//! The CSV artifact and the model's feature matrix both derive their
//! layout from this module, so a column rename or reorder is a schema
//! change here, not an incidental drift in two places.

/// Raw price columns, in table order.
pub const COL_OPEN: &str = "open";
pub const COL_HIGH: &str = "high";
pub const COL_LOW: &str = "low";
pub const COL_CLOSE: &str = "close";
pub const COL_VOLUME: &str = "volume";

/// Derived price columns.
pub const COL_RETURN: &str = "return";
pub const COL_MA_20: &str = "ma_20";
pub const COL_MA_100: &str = "ma_100";
pub const COL_VOLATILITY: &str = "volatility";

/// Auxiliary raw columns.
pub const COL_ACTIVITY: &str = "activity";
pub const COL_HASHRATE: &str = "hashrate";
pub const COL_SENTIMENT: &str = "sentiment";

/// Auxiliary derived columns.
pub const COL_ACTIVITY_EWMA: &str = "activity_ewma";
pub const COL_HASHRATE_ZSCORE: &str = "hashrate_zscore";

/// Header column for the date index in CSV exports.
pub const COL_DATE: &str = "date";

/// Column name for a cross-asset return series, e.g. `sp500_return`.
pub fn cross_column(label: &str) -> String {
    format!("{label}_return")
}

/// Canonical column order for a fused table (the date index excluded —
/// it is the table's row key, written first on export).
///
/// Cross-asset columns appear in configured list order, between the raw
/// auxiliary columns and the auxiliary-derived ones.
pub fn table_columns(cross_labels: &[String]) -> Vec<String> {
    let mut cols: Vec<String> = vec![
        COL_OPEN.into(),
        COL_HIGH.into(),
        COL_LOW.into(),
        COL_CLOSE.into(),
        COL_VOLUME.into(),
        COL_RETURN.into(),
        COL_MA_20.into(),
        COL_MA_100.into(),
        COL_VOLATILITY.into(),
        COL_ACTIVITY.into(),
        COL_HASHRATE.into(),
        COL_SENTIMENT.into(),
    ];
    cols.extend(cross_labels.iter().map(|l| cross_column(l)));
    cols.push(COL_ACTIVITY_EWMA.into());
    cols.push(COL_HASHRATE_ZSCORE.into());
    cols
}

/// The model's feature set, in training order.
///
/// A strict subset of [`table_columns`]: raw activity and hash-rate feed
/// the model only through their derived forms, while volume and the
/// sentiment index enter raw.
pub fn model_features(cross_labels: &[String]) -> Vec<String> {
    let mut feats: Vec<String> = vec![
        COL_RETURN.into(),
        COL_MA_20.into(),
        COL_MA_100.into(),
        COL_VOLATILITY.into(),
        COL_VOLUME.into(),
        COL_ACTIVITY_EWMA.into(),
        COL_HASHRATE_ZSCORE.into(),
        COL_SENTIMENT.into(),
    ];
    feats.extend(cross_labels.iter().map(|l| cross_column(l)));
    feats
}
