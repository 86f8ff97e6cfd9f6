//! Blockchain.info network hash-rate adapter.
//!
//! The charts endpoint returns `{x, y}` pairs where `x` is a unix
//! timestamp and `y` the estimated hash rate in TH/s.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::cache::{fetch_cached, CacheKey, FetchCache};
use super::source::{get_json, FetchMode, SourceError};
use crate::domain::SeriesPoint;

/// Hash-rate observations revalidate daily.
pub const HASHRATE_TTL_SECS: u64 = 86_400;

const SOURCE: &str = "hashrate";

#[derive(Debug, Deserialize)]
struct ChartSeries {
    values: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
struct ChartPoint {
    x: i64,
    y: f64,
}

/// Daily network hash rate over a relative timespan.
pub struct HashRateSource {
    timespan: String,
}

impl HashRateSource {
    pub fn new(timespan: impl Into<String>) -> Self {
        Self {
            timespan: timespan.into(),
        }
    }

    /// Fetch the series through the cache. Failures degrade to an
    /// empty vec.
    pub fn fetch(
        &self,
        client: &reqwest::blocking::Client,
        cache: &FetchCache,
        mode: FetchMode,
    ) -> Vec<SeriesPoint> {
        let key = CacheKey::new(SOURCE, format!("timespan={}", self.timespan));
        fetch_cached(cache, &key, HASHRATE_TTL_SECS, mode, || {
            fetch_hash_rate(client, &self.timespan)
        })
    }
}

fn chart_url(timespan: &str) -> String {
    format!(
        "https://api.blockchain.info/charts/hash-rate\
         ?timespan={timespan}&format=json&cors=true"
    )
}

fn fetch_hash_rate(
    client: &reqwest::blocking::Client,
    timespan: &str,
) -> Result<Vec<SeriesPoint>, SourceError> {
    let url = chart_url(timespan);
    let series: ChartSeries = get_json(client, SOURCE, &url)?;
    let points = parse_points(series);
    if points.is_empty() {
        return Err(SourceError::NoData { source: SOURCE });
    }
    Ok(points)
}

/// Timestamps collapse to UTC dates, last observation per day wins.
fn parse_points(series: ChartSeries) -> Vec<SeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in series.values {
        let Some(date) =
            chrono::DateTime::from_timestamp(point.x, 0).map(|dt| dt.naive_utc().date())
        else {
            continue;
        };
        if point.y.is_finite() {
            by_date.insert(date, point.y);
        }
    }
    by_date
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}
