//! TTL fetch cache shared by all source adapters.
//!
//! Layout: `{cache_dir}/{source}-{key16}.parquet` plus a JSON meta
//! sidecar per entry carrying the fetch time and TTL.
//!
//! - Atomic writes (write to .tmp, rename into place)
//! - Freshness from the sidecar's `fetched_at` against wall clock
//! - Corrupt payloads quarantined (`*.corrupt`), never re-served
//! - The cache object is passed explicitly into every adapter call;
//!   there is no ambient global state
//!
//! `fetch_cached` is the single policy point: fresh hit short-circuits
//! the network, a failed or empty fetch falls back to a stale entry if
//! one exists, and total failure surfaces as an empty payload.

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::source::{FetchMode, SourceError};
use crate::domain::{OhlcvBar, SeriesPoint};

/// Sidecar schema version; entries written by other versions read as a miss.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Identity of one cache entry: the source name plus its canonical params.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    source: &'static str,
    params: String,
}

impl CacheKey {
    pub fn new(source: &'static str, params: impl Into<String>) -> Self {
        Self {
            source,
            params: params.into(),
        }
    }

    /// File stem: source name plus 16 hex chars of the params hash.
    fn stem(&self) -> String {
        let hash = blake3::hash(format!("{}\n{}", self.source, self.params).as_bytes());
        format!("{}-{}", self.source, &hash.to_hex().as_str()[..16])
    }
}

/// Metadata sidecar for a cache entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheMeta {
    pub schema_version: u32,
    pub source: String,
    pub params: String,
    pub fetched_at: NaiveDateTime,
    pub ttl_secs: u64,
    pub rows: usize,
}

/// One line of `status()` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntryStatus {
    pub source: String,
    pub params: String,
    pub fetched_at: NaiveDateTime,
    pub age_secs: i64,
    pub ttl_secs: u64,
    pub fresh: bool,
    pub rows: usize,
}

/// A payload loaded from cache, with its age.
#[derive(Debug)]
pub struct CachedEntry<P> {
    pub payload: P,
    pub age_secs: i64,
}

/// The on-disk fetch cache.
pub struct FetchCache {
    cache_dir: PathBuf,
}

impl FetchCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    fn payload_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.parquet", key.stem()))
    }

    fn meta_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(format!("{}.meta.json", key.stem()))
    }

    /// Read the meta sidecar; version mismatch reads as a miss.
    fn read_meta(&self, key: &CacheKey) -> Option<CacheMeta> {
        let content = fs::read_to_string(self.meta_path(key)).ok()?;
        let meta: CacheMeta = serde_json::from_str(&content).ok()?;
        if meta.schema_version != CACHE_SCHEMA_VERSION {
            return None;
        }
        Some(meta)
    }

    fn write_entry(&self, key: &CacheKey, df: &DataFrame, ttl_secs: u64) -> Result<(), SourceError> {
        fs::create_dir_all(&self.cache_dir)
            .map_err(|e| SourceError::Cache(format!("failed to create dir: {e}")))?;

        let path = self.payload_path(key);
        let tmp_path = path.with_extension("parquet.tmp");
        write_parquet(df, &tmp_path)?;
        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SourceError::Cache(format!("atomic rename failed: {e}"))
        })?;

        let meta = CacheMeta {
            schema_version: CACHE_SCHEMA_VERSION,
            source: key.source.to_string(),
            params: key.params.clone(),
            fetched_at: chrono::Local::now().naive_local(),
            ttl_secs,
            rows: df.height(),
        };
        let meta_json = serde_json::to_string_pretty(&meta)
            .map_err(|e| SourceError::Cache(format!("meta serialization: {e}")))?;
        fs::write(self.meta_path(key), meta_json)
            .map_err(|e| SourceError::Cache(format!("meta write: {e}")))?;
        Ok(())
    }

    fn read_entry(&self, key: &CacheKey) -> Result<Option<(DataFrame, i64)>, SourceError> {
        let Some(meta) = self.read_meta(key) else {
            return Ok(None);
        };
        let path = self.payload_path(key);
        if !path.exists() {
            return Ok(None);
        }
        match read_parquet(&path) {
            Ok(df) => {
                let age = chrono::Local::now().naive_local() - meta.fetched_at;
                Ok(Some((df, age.num_seconds())))
            }
            Err(e) => {
                // Quarantine, then report a miss so the caller re-fetches.
                let quarantine = path.with_extension("parquet.corrupt");
                warn!(
                    source = key.source,
                    path = %path.display(),
                    error = %e,
                    "quarantining corrupt cache entry"
                );
                let _ = fs::rename(&path, &quarantine);
                let _ = fs::remove_file(self.meta_path(key));
                Ok(None)
            }
        }
    }

    /// Store an OHLCV payload. Empty payloads are not cacheable.
    pub fn store_bars(
        &self,
        key: &CacheKey,
        bars: &[OhlcvBar],
        ttl_secs: u64,
    ) -> Result<(), SourceError> {
        if bars.is_empty() {
            return Err(SourceError::Cache("empty payload".into()));
        }
        let df = bars_to_dataframe(bars)?;
        self.write_entry(key, &df, ttl_secs)
    }

    /// Load an OHLCV payload with its age, or None on miss.
    pub fn load_bars(&self, key: &CacheKey) -> Result<Option<CachedEntry<Vec<OhlcvBar>>>, SourceError> {
        match self.read_entry(key)? {
            None => Ok(None),
            Some((df, age_secs)) => Ok(Some(CachedEntry {
                payload: dataframe_to_bars(&df)?,
                age_secs,
            })),
        }
    }

    /// Store a date/value series payload. Empty payloads are not cacheable.
    pub fn store_series(
        &self,
        key: &CacheKey,
        points: &[SeriesPoint],
        ttl_secs: u64,
    ) -> Result<(), SourceError> {
        if points.is_empty() {
            return Err(SourceError::Cache("empty payload".into()));
        }
        let df = series_to_dataframe(points)?;
        self.write_entry(key, &df, ttl_secs)
    }

    /// Load a series payload with its age, or None on miss.
    pub fn load_series(
        &self,
        key: &CacheKey,
    ) -> Result<Option<CachedEntry<Vec<SeriesPoint>>>, SourceError> {
        match self.read_entry(key)? {
            None => Ok(None),
            Some((df, age_secs)) => Ok(Some(CachedEntry {
                payload: dataframe_to_series(&df)?,
                age_secs,
            })),
        }
    }

    /// Per-entry status of everything currently cached.
    pub fn status(&self) -> Vec<CacheEntryStatus> {
        let mut out = Vec::new();
        let Ok(entries) = fs::read_dir(&self.cache_dir) else {
            return out;
        };
        let now = chrono::Local::now().naive_local();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if !name.ends_with(".meta.json") {
                continue;
            }
            let Ok(content) = fs::read_to_string(&path) else {
                continue;
            };
            let Ok(meta) = serde_json::from_str::<CacheMeta>(&content) else {
                continue;
            };
            let age_secs = (now - meta.fetched_at).num_seconds();
            out.push(CacheEntryStatus {
                source: meta.source,
                params: meta.params,
                fetched_at: meta.fetched_at,
                age_secs,
                ttl_secs: meta.ttl_secs,
                fresh: age_secs <= meta.ttl_secs as i64,
                rows: meta.rows,
            });
        }
        out.sort_by(|a, b| a.source.cmp(&b.source).then(a.params.cmp(&b.params)));
        out
    }

    /// Remove every cache entry. Returns the number of files removed.
    pub fn clean(&self) -> Result<usize, SourceError> {
        let mut removed = 0;
        let entries = match fs::read_dir(&self.cache_dir) {
            Ok(e) => e,
            Err(_) => return Ok(0),
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let known = name.ends_with(".parquet")
                || name.ends_with(".meta.json")
                || name.ends_with(".parquet.corrupt")
                || name.ends_with(".parquet.tmp");
            if known && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

// ── Through-cache fetch policy ──────────────────────────────────────

/// Payloads the cache can hold.
pub trait CachePayload: Sized {
    fn empty_payload() -> Self;
    fn is_empty_payload(&self) -> bool;
    fn load_from(cache: &FetchCache, key: &CacheKey) -> Result<Option<CachedEntry<Self>>, SourceError>;
    fn store_to(&self, cache: &FetchCache, key: &CacheKey, ttl_secs: u64) -> Result<(), SourceError>;
}

impl CachePayload for Vec<OhlcvBar> {
    fn empty_payload() -> Self {
        Vec::new()
    }

    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }

    fn load_from(cache: &FetchCache, key: &CacheKey) -> Result<Option<CachedEntry<Self>>, SourceError> {
        cache.load_bars(key)
    }

    fn store_to(&self, cache: &FetchCache, key: &CacheKey, ttl_secs: u64) -> Result<(), SourceError> {
        cache.store_bars(key, self, ttl_secs)
    }
}

impl CachePayload for Vec<SeriesPoint> {
    fn empty_payload() -> Self {
        Vec::new()
    }

    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }

    fn load_from(cache: &FetchCache, key: &CacheKey) -> Result<Option<CachedEntry<Self>>, SourceError> {
        cache.load_series(key)
    }

    fn store_to(&self, cache: &FetchCache, key: &CacheKey, ttl_secs: u64) -> Result<(), SourceError> {
        cache.store_series(key, self, ttl_secs)
    }
}

/// Serve a payload through the cache.
///
/// Online: fresh hit → cached payload; otherwise fetch, store on
/// success, fall back to the stale entry (or empty) on failure.
/// Offline: cached payload at any age, else empty. All failure paths
/// log at `warn!` and return emptiness — adapters never raise upward.
pub fn fetch_cached<P: CachePayload>(
    cache: &FetchCache,
    key: &CacheKey,
    ttl_secs: u64,
    mode: FetchMode,
    fetch: impl FnOnce() -> Result<P, SourceError>,
) -> P {
    let cached = match P::load_from(cache, key) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(source = key.source, error = %e, "cache read failed");
            None
        }
    };

    let mut stale: Option<CachedEntry<P>> = None;
    match (mode, cached) {
        (FetchMode::Offline, Some(entry)) => {
            if entry.age_secs > ttl_secs as i64 {
                warn!(
                    source = key.source,
                    age_secs = entry.age_secs,
                    "offline: serving stale cache entry"
                );
            }
            return entry.payload;
        }
        (FetchMode::Offline, None) => {
            warn!(source = key.source, "offline with no cached entry");
            return P::empty_payload();
        }
        (FetchMode::Online, Some(entry)) => {
            if entry.age_secs <= ttl_secs as i64 {
                debug!(source = key.source, age_secs = entry.age_secs, "fresh cache hit");
                return entry.payload;
            }
            stale = Some(entry);
        }
        (FetchMode::Online, None) => {}
    }

    match fetch() {
        Ok(payload) if !payload.is_empty_payload() => {
            if let Err(e) = payload.store_to(cache, key, ttl_secs) {
                warn!(source = key.source, error = %e, "cache write failed");
            }
            payload
        }
        Ok(_) => {
            warn!(source = key.source, "fetch returned no observations");
            stale_or_empty(stale, key)
        }
        Err(e) => {
            warn!(source = key.source, error = %e, "fetch failed");
            stale_or_empty(stale, key)
        }
    }
}

fn stale_or_empty<P: CachePayload>(stale: Option<CachedEntry<P>>, key: &CacheKey) -> P {
    match stale {
        Some(entry) => {
            warn!(
                source = key.source,
                age_secs = entry.age_secs,
                "falling back to stale cache entry"
            );
            entry.payload
        }
        None => P::empty_payload(),
    }
}

// ── Parquet I/O helpers ─────────────────────────────────────────────

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch date")
}

fn dates_column(dates: impl Iterator<Item = NaiveDate>) -> Result<Column, SourceError> {
    let days: Vec<i32> = dates.map(|d| (d - epoch()).num_days() as i32).collect();
    Column::new("date".into(), days)
        .cast(&DataType::Date)
        .map_err(|e| SourceError::Cache(format!("date cast: {e}")))
}

fn bars_to_dataframe(bars: &[OhlcvBar]) -> Result<DataFrame, SourceError> {
    let opens: Vec<f64> = bars.iter().map(|b| b.open).collect();
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    DataFrame::new(vec![
        dates_column(bars.iter().map(|b| b.date))?,
        Column::new("open".into(), opens),
        Column::new("high".into(), highs),
        Column::new("low".into(), lows),
        Column::new("close".into(), closes),
        Column::new("volume".into(), volumes),
    ])
    .map_err(|e| SourceError::Cache(format!("dataframe creation: {e}")))
}

fn series_to_dataframe(points: &[SeriesPoint]) -> Result<DataFrame, SourceError> {
    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    DataFrame::new(vec![
        dates_column(points.iter().map(|p| p.date))?,
        Column::new("value".into(), values),
    ])
    .map_err(|e| SourceError::Cache(format!("dataframe creation: {e}")))
}

fn write_parquet(df: &DataFrame, path: &Path) -> Result<(), SourceError> {
    let file =
        fs::File::create(path).map_err(|e| SourceError::Cache(format!("create file: {e}")))?;
    ParquetWriter::new(file)
        .finish(&mut df.clone())
        .map_err(|e| SourceError::Cache(format!("write parquet: {e}")))?;
    Ok(())
}

fn read_parquet(path: &Path) -> Result<DataFrame, SourceError> {
    let file = fs::File::open(path).map_err(|e| SourceError::Cache(format!("open: {e}")))?;
    let df = ParquetReader::new(file)
        .finish()
        .map_err(|e| SourceError::Cache(format!("read: {e}")))?;
    if df.height() == 0 {
        return Err(SourceError::Cache("empty parquet file".into()));
    }
    Ok(df)
}

fn date_values(df: &DataFrame) -> Result<Vec<NaiveDate>, SourceError> {
    let col = df
        .column("date")
        .map_err(|e| SourceError::Cache(format!("date column: {e}")))?;
    let ca = col
        .date()
        .map_err(|e| SourceError::Cache(format!("date column type: {e}")))?;
    let mut out = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let days = ca
            .get(i)
            .ok_or_else(|| SourceError::Cache(format!("null date at row {i}")))?;
        out.push(epoch() + chrono::Duration::days(days as i64));
    }
    Ok(out)
}

fn f64_values(df: &DataFrame, name: &str) -> Result<Vec<f64>, SourceError> {
    let col = df
        .column(name)
        .map_err(|e| SourceError::Cache(format!("{name} column: {e}")))?;
    let ca = col
        .f64()
        .map_err(|e| SourceError::Cache(format!("{name} column type: {e}")))?;
    Ok((0..df.height()).map(|i| ca.get(i).unwrap_or(f64::NAN)).collect())
}

fn dataframe_to_bars(df: &DataFrame) -> Result<Vec<OhlcvBar>, SourceError> {
    let dates = date_values(df)?;
    let opens = f64_values(df, "open")?;
    let highs = f64_values(df, "high")?;
    let lows = f64_values(df, "low")?;
    let closes = f64_values(df, "close")?;
    let volumes = f64_values(df, "volume")?;

    Ok((0..df.height())
        .map(|i| OhlcvBar {
            date: dates[i],
            open: opens[i],
            high: highs[i],
            low: lows[i],
            close: closes[i],
            volume: volumes[i],
        })
        .collect())
}

fn dataframe_to_series(df: &DataFrame) -> Result<Vec<SeriesPoint>, SourceError> {
    let dates = date_values(df)?;
    let values = f64_values(df, "value")?;
    Ok((0..df.height())
        .map(|i| SeriesPoint {
            date: dates[i],
            value: values[i],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn temp_cache_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let dir = env::temp_dir().join(format!("btclab_cache_test_{}_{id}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_bars() -> Vec<OhlcvBar> {
        vec![
            OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                open: 100.0,
                high: 102.0,
                low: 99.0,
                close: 101.0,
                volume: 1000.0,
            },
            OhlcvBar {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                open: 101.0,
                high: 103.0,
                low: 100.0,
                close: 102.0,
                volume: 1100.0,
            },
        ]
    }

    fn sample_points() -> Vec<SeriesPoint> {
        vec![
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                value: 42.0,
            },
            SeriesPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                value: 43.5,
            },
        ]
    }

    /// Rewrite an entry's sidecar so it looks `age_secs` old.
    fn backdate_entry(cache: &FetchCache, key: &CacheKey, age_secs: i64) {
        let path = cache.meta_path(key);
        let content = fs::read_to_string(&path).unwrap();
        let mut meta: CacheMeta = serde_json::from_str(&content).unwrap();
        meta.fetched_at -= chrono::Duration::seconds(age_secs);
        fs::write(&path, serde_json::to_string_pretty(&meta).unwrap()).unwrap();
    }

    #[test]
    fn bars_roundtrip() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("price", "ticker=BTC-USD&range=2y");

        cache.store_bars(&key, &sample_bars(), 3600).unwrap();
        let entry = cache.load_bars(&key).unwrap().unwrap();

        assert_eq!(entry.payload.len(), 2);
        assert_eq!(entry.payload[0].close, 101.0);
        assert_eq!(
            entry.payload[1].date,
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap()
        );
        assert!(entry.age_secs <= 60);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn series_roundtrip() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("sentiment", "limit=730");

        cache.store_series(&key, &sample_points(), 86400).unwrap();
        let entry = cache.load_series(&key).unwrap().unwrap();

        assert_eq!(entry.payload, sample_points());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("hashrate", "timespan=2years");
        assert!(cache.load_series(&key).unwrap().is_none());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn empty_payload_not_cacheable() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("price", "x");
        assert!(cache.store_bars(&key, &[], 60).is_err());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn fresh_hit_skips_fetch() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("sentiment", "limit=730");
        cache.store_series(&key, &sample_points(), 86400).unwrap();

        let out: Vec<SeriesPoint> = fetch_cached(&cache, &key, 86400, FetchMode::Online, || {
            panic!("must not fetch on fresh hit")
        });
        assert_eq!(out, sample_points());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn stale_entry_refetched_and_overwritten() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("sentiment", "limit=730");
        cache.store_series(&key, &sample_points(), 60).unwrap();
        backdate_entry(&cache, &key, 7200);

        let newer = vec![SeriesPoint {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            value: 55.0,
        }];
        let fetched = newer.clone();
        let out = fetch_cached(&cache, &key, 60, FetchMode::Online, move || Ok(fetched));
        assert_eq!(out, newer);

        // overwritten entry is now fresh
        let entry = cache.load_series(&key).unwrap().unwrap();
        assert_eq!(entry.payload, newer);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_fetch_falls_back_to_stale() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("activity", "repo=bitcoin/bitcoin");
        cache.store_series(&key, &sample_points(), 60).unwrap();
        backdate_entry(&cache, &key, 7200);

        let out: Vec<SeriesPoint> = fetch_cached(&cache, &key, 60, FetchMode::Online, || {
            Err(SourceError::NetworkUnreachable("dns".into()))
        });
        assert_eq!(out, sample_points());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn failed_fetch_without_cache_is_empty() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("activity", "repo=bitcoin/bitcoin");

        let out: Vec<SeriesPoint> = fetch_cached(&cache, &key, 60, FetchMode::Online, || {
            Err(SourceError::NetworkUnreachable("dns".into()))
        });
        assert!(out.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn offline_serves_stale_and_never_fetches() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("price", "ticker=BTC-USD");
        cache.store_bars(&key, &sample_bars(), 60).unwrap();
        backdate_entry(&cache, &key, 7200);

        let out: Vec<OhlcvBar> = fetch_cached(&cache, &key, 60, FetchMode::Offline, || {
            panic!("offline must not fetch")
        });
        assert_eq!(out.len(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn offline_without_cache_is_empty() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("price", "ticker=BTC-USD");

        let out: Vec<OhlcvBar> = fetch_cached(&cache, &key, 60, FetchMode::Offline, || {
            panic!("offline must not fetch")
        });
        assert!(out.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn corrupt_payload_quarantined() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("price", "ticker=BTC-USD");
        cache.store_bars(&key, &sample_bars(), 3600).unwrap();

        // Truncate the payload so the parquet footer is gone.
        fs::write(cache.payload_path(&key), b"garbage").unwrap();

        assert!(cache.load_bars(&key).unwrap().is_none());
        assert!(cache
            .payload_path(&key)
            .with_extension("parquet.corrupt")
            .exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn status_reports_freshness() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let fresh_key = CacheKey::new("sentiment", "limit=730");
        let stale_key = CacheKey::new("activity", "repo=bitcoin/bitcoin");
        cache.store_series(&fresh_key, &sample_points(), 86400).unwrap();
        cache.store_series(&stale_key, &sample_points(), 60).unwrap();
        backdate_entry(&cache, &stale_key, 7200);

        let status = cache.status();
        assert_eq!(status.len(), 2);
        let activity = status.iter().find(|s| s.source == "activity").unwrap();
        let sentiment = status.iter().find(|s| s.source == "sentiment").unwrap();
        assert!(!activity.fresh);
        assert!(sentiment.fresh);
        assert_eq!(sentiment.rows, 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn clean_removes_everything() {
        let dir = temp_cache_dir();
        let cache = FetchCache::new(&dir);
        let key = CacheKey::new("sentiment", "limit=730");
        cache.store_series(&key, &sample_points(), 86400).unwrap();

        let removed = cache.clean().unwrap();
        assert_eq!(removed, 2); // payload + sidecar
        assert!(cache.status().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn key_stem_is_stable_and_distinct() {
        let a = CacheKey::new("price", "ticker=BTC-USD");
        let b = CacheKey::new("price", "ticker=BTC-USD");
        let c = CacheKey::new("price", "ticker=ETH-USD");
        assert_eq!(a.stem(), b.stem());
        assert_ne!(a.stem(), c.stem());
        assert!(a.stem().starts_with("price-"));
    }
}
