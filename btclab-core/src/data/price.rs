//! Yahoo Finance price adapter.
//!
//! Fetches daily OHLCV bars from Yahoo's v8 chart API for the primary
//! ticker, and close-only series for the cross-asset adapter. Yahoo
//! has no official API and is subject to unannounced format changes;
//! parse failures surface as `ResponseFormatChanged` and the cache
//! fallback takes over.

use chrono::NaiveDate;
use serde::Deserialize;

use super::cache::{fetch_cached, CacheKey, FetchCache};
use super::source::{get_json, FetchMode, SourceError};
use crate::domain::{canonicalize_bars, OhlcvBar};

/// Price bars revalidate hourly.
pub const PRICE_TTL_SECS: u64 = 3600;

const SOURCE: &str = "price";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Daily OHLCV history for one ticker.
pub struct PriceSource {
    ticker: String,
    range: String,
}

impl PriceSource {
    pub fn new(ticker: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            range: range.into(),
        }
    }

    /// Fetch bars through the cache. Failures degrade to an empty vec.
    pub fn fetch(
        &self,
        client: &reqwest::blocking::Client,
        cache: &FetchCache,
        mode: FetchMode,
    ) -> Vec<OhlcvBar> {
        let key = CacheKey::new(
            SOURCE,
            format!("ticker={}&range={}", self.ticker, self.range),
        );
        fetch_cached(cache, &key, PRICE_TTL_SECS, mode, || {
            fetch_chart_bars(client, SOURCE, &self.ticker, &self.range)
        })
    }
}

/// Build the chart API URL for a ticker and relative range.
fn chart_url(ticker: &str, range: &str) -> String {
    format!(
        "https://query2.finance.yahoo.com/v8/finance/chart/{ticker}\
         ?range={range}&interval=1d"
    )
}

/// One chart request, parsed and canonicalized. Shared with the
/// cross-asset adapter, which fetches other tickers the same way.
pub(crate) fn fetch_chart_bars(
    client: &reqwest::blocking::Client,
    source: &'static str,
    ticker: &str,
    range: &str,
) -> Result<Vec<OhlcvBar>, SourceError> {
    let url = chart_url(ticker, range);
    let resp: ChartResponse = get_json(client, source, &url)?;
    let bars = parse_chart(ticker, resp)?;
    let bars = canonicalize_bars(bars);
    if bars.is_empty() {
        return Err(SourceError::NoData { source });
    }
    Ok(bars)
}

/// Parse the chart API response into bars.
///
/// Rows where every quote field is None are non-trading days and
/// skipped; rows with partial data get NaN fills and are dropped
/// later by canonicalization.
fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<Vec<OhlcvBar>, SourceError> {
    let result = resp.chart.result.ok_or_else(|| {
        if let Some(err) = resp.chart.error {
            SourceError::ResponseFormatChanged(format!(
                "{ticker}: {}: {}",
                err.code, err.description
            ))
        } else {
            SourceError::ResponseFormatChanged(format!("{ticker}: empty result with no error"))
        }
    })?;

    let data = result.into_iter().next().ok_or_else(|| {
        SourceError::ResponseFormatChanged(format!("{ticker}: result array is empty"))
    })?;

    let timestamps = data
        .timestamp
        .ok_or_else(|| SourceError::ResponseFormatChanged(format!("{ticker}: no timestamps")))?;

    let quote = data.indicators.quote.into_iter().next().ok_or_else(|| {
        SourceError::ResponseFormatChanged(format!("{ticker}: no quote data"))
    })?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, &ts) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.naive_utc().date())
            .ok_or_else(|| {
                SourceError::ResponseFormatChanged(format!("{ticker}: invalid timestamp: {ts}"))
            })?;

        let open = quote.open.get(i).copied().flatten();
        let high = quote.high.get(i).copied().flatten();
        let low = quote.low.get(i).copied().flatten();
        let close = quote.close.get(i).copied().flatten();
        let volume = quote.volume.get(i).copied().flatten();

        if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none()
        {
            continue;
        }

        bars.push(OhlcvBar {
            date,
            open: open.unwrap_or(f64::NAN),
            high: high.unwrap_or(f64::NAN),
            low: low.unwrap_or(f64::NAN),
            close: close.unwrap_or(f64::NAN),
            volume: volume.map(|v| v as f64).unwrap_or(f64::NAN),
        });
    }

    Ok(bars)
}
