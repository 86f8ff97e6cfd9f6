//! Fear & Greed sentiment adapter (alternative.me).
//!
//! The API returns newest-first entries with the index value and the
//! unix timestamp both encoded as strings. Values live on a 0..=100
//! scale; anything unparseable or out of range is dropped rather than
//! clamped.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;

use super::cache::{fetch_cached, CacheKey, FetchCache};
use super::source::{get_json, FetchMode, SourceError};
use crate::domain::SeriesPoint;

/// Sentiment readings revalidate daily.
pub const SENTIMENT_TTL_SECS: u64 = 86_400;

const SOURCE: &str = "sentiment";

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    timestamp: String,
}

/// Daily Fear & Greed index readings.
pub struct SentimentSource {
    limit: u32,
}

impl SentimentSource {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    /// Fetch the series through the cache. Failures degrade to an
    /// empty vec.
    pub fn fetch(
        &self,
        client: &reqwest::blocking::Client,
        cache: &FetchCache,
        mode: FetchMode,
    ) -> Vec<SeriesPoint> {
        let key = CacheKey::new(SOURCE, format!("limit={}", self.limit));
        fetch_cached(cache, &key, SENTIMENT_TTL_SECS, mode, || {
            fetch_sentiment(client, self.limit)
        })
    }
}

fn fng_url(limit: u32) -> String {
    format!("https://api.alternative.me/fng/?limit={limit}&format=json")
}

fn fetch_sentiment(
    client: &reqwest::blocking::Client,
    limit: u32,
) -> Result<Vec<SeriesPoint>, SourceError> {
    let url = fng_url(limit);
    let resp: FngResponse = get_json(client, SOURCE, &url)?;
    let points = parse_entries(resp.data);
    if points.is_empty() {
        return Err(SourceError::NoData { source: SOURCE });
    }
    Ok(points)
}

/// Decode the stringly payload into ascending daily points.
fn parse_entries(entries: Vec<FngEntry>) -> Vec<SeriesPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    // newest first; iterate in reverse so the newer entry wins a
    // same-day collision
    for entry in entries.into_iter().rev() {
        let Ok(ts) = entry.timestamp.parse::<i64>() else {
            continue;
        };
        let Some(date) = chrono::DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc().date())
        else {
            continue;
        };
        let Ok(value) = entry.value.parse::<f64>() else {
            continue;
        };
        if !(0.0..=100.0).contains(&value) {
            continue;
        }
        by_date.insert(date, value);
    }
    by_date
        .into_iter()
        .map(|(date, value)| SeriesPoint { date, value })
        .collect()
}
