//! Cross-asset market context adapter.
//!
//! Fetches daily bars for a basket of related tickers through the same
//! Yahoo chart endpoint as the primary price source and reduces each to
//! a log-return series on that asset's own trading calendar. Equity and
//! futures symbols trade five days a week, so their returns land on the
//! crypto calendar with gaps; fusion forward-fills them.

use serde::{Deserialize, Serialize};

use super::cache::{fetch_cached, CacheKey, FetchCache};
use super::price::fetch_chart_bars;
use super::source::FetchMode;
use crate::domain::{OhlcvBar, SeriesPoint, TimeSeries};

/// Cross-asset bars revalidate hourly, like the primary price series.
pub const CROSS_TTL_SECS: u64 = 3600;

const SOURCE: &str = "cross";

/// One auxiliary symbol and the short label its feature column wears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossAsset {
    pub symbol: String,
    pub label: String,
}

impl CrossAsset {
    pub fn new(symbol: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            label: label.into(),
        }
    }
}

/// The standard basket: S&P 500, gold futures, and the two largest
/// alternative coins.
pub fn default_cross_assets() -> Vec<CrossAsset> {
    vec![
        CrossAsset::new("^GSPC", "sp500"),
        CrossAsset::new("GC=F", "gold"),
        CrossAsset::new("ETH-USD", "eth"),
        CrossAsset::new("SOL-USD", "sol"),
    ]
}

/// Log-return series for a basket of market symbols.
pub struct CrossAssetSource {
    assets: Vec<CrossAsset>,
    range: String,
}

impl CrossAssetSource {
    pub fn new(assets: Vec<CrossAsset>, range: impl Into<String>) -> Self {
        Self {
            assets,
            range: range.into(),
        }
    }

    /// Fetch every asset through the cache and reduce to returns.
    /// A failed asset contributes an empty series under its label.
    pub fn fetch(
        &self,
        client: &reqwest::blocking::Client,
        cache: &FetchCache,
        mode: FetchMode,
    ) -> Vec<(String, Vec<SeriesPoint>)> {
        self.assets
            .iter()
            .map(|asset| {
                let key = CacheKey::new(
                    SOURCE,
                    format!("ticker={}&range={}", asset.symbol, self.range),
                );
                let bars: Vec<OhlcvBar> =
                    fetch_cached(cache, &key, CROSS_TTL_SECS, mode, || {
                        fetch_chart_bars(client, SOURCE, &asset.symbol, &self.range)
                    });
                (asset.label.clone(), close_returns(&asset.label, &bars))
            })
            .collect()
    }
}

/// Daily log returns of the close, on the asset's own calendar.
fn close_returns(label: &str, bars: &[OhlcvBar]) -> Vec<SeriesPoint> {
    let closes: Vec<SeriesPoint> = bars
        .iter()
        .map(|b| SeriesPoint {
            date: b.date,
            value: b.close,
        })
        .collect();
    TimeSeries::new(label, closes)
        .log_returns(label)
        .points()
        .to_vec()
}
