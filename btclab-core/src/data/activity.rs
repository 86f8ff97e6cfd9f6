//! GitHub commit-activity adapter.
//!
//! Pages through the repository commits endpoint (newest first, up to
//! three pages of 100) and aggregates commit timestamps into a daily
//! count series. A short recent window is all the downstream EWMA
//! needs; the pagination cap keeps the adapter inside unauthenticated
//! rate limits.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use super::cache::{fetch_cached, CacheKey, FetchCache};
use super::source::{get_json_accept, FetchMode, SourceError};
use crate::domain::SeriesPoint;

/// Commit counts revalidate daily.
pub const ACTIVITY_TTL_SECS: u64 = 86_400;

const SOURCE: &str = "activity";
const PER_PAGE: usize = 100;
const MAX_PAGES: usize = 3;
const ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    author: Option<CommitSignature>,
}

#[derive(Debug, Deserialize)]
struct CommitSignature {
    date: DateTime<Utc>,
}

/// Daily commit counts for one `owner/name` repository.
pub struct ActivitySource {
    repo: String,
}

impl ActivitySource {
    pub fn new(repo: impl Into<String>) -> Self {
        Self { repo: repo.into() }
    }

    /// Fetch the daily count series through the cache. Failures
    /// degrade to an empty vec.
    pub fn fetch(
        &self,
        client: &reqwest::blocking::Client,
        cache: &FetchCache,
        mode: FetchMode,
    ) -> Vec<SeriesPoint> {
        let key = CacheKey::new(SOURCE, format!("repo={}", self.repo));
        fetch_cached(cache, &key, ACTIVITY_TTL_SECS, mode, || {
            fetch_commit_counts(client, &self.repo)
        })
    }
}

fn commits_url(repo: &str, page: usize) -> String {
    format!("https://api.github.com/repos/{repo}/commits?per_page={PER_PAGE}&page={page}")
}

fn fetch_commit_counts(
    client: &reqwest::blocking::Client,
    repo: &str,
) -> Result<Vec<SeriesPoint>, SourceError> {
    let mut dates = Vec::new();
    for page in 1..=MAX_PAGES {
        let url = commits_url(repo, page);
        let entries: Vec<CommitEntry> = get_json_accept(client, SOURCE, &url, ACCEPT)?;
        let page_len = entries.len();
        dates.extend(
            entries
                .into_iter()
                .filter_map(|e| e.commit.author)
                .map(|sig| sig.date.naive_utc().date()),
        );
        // A short page means the history is exhausted.
        if page_len < PER_PAGE {
            break;
        }
    }

    if dates.is_empty() {
        return Err(SourceError::NoData { source: SOURCE });
    }
    Ok(daily_counts(dates))
}

/// Collapse commit dates into one point per day, ascending.
fn daily_counts(dates: Vec<NaiveDate>) -> Vec<SeriesPoint> {
    let mut counts: BTreeMap<NaiveDate, u32> = BTreeMap::new();
    for date in dates {
        *counts.entry(date).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(date, count)| SeriesPoint {
            date,
            value: f64::from(count),
        })
        .collect()
}
