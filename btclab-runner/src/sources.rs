//! Source gathering for the forecast runner.
//!
//! Fans the five adapters out over rayon workers and collects their
//! payloads into [`FusionInputs`]. Adapter failures degrade to empty
//! payloads inside the cache layer, so gathering itself never fails;
//! an unusable primary series surfaces later as a fusion error.

use rayon::scope;
use tracing::info;

use btclab_core::data::{
    http_client, ActivitySource, CrossAssetSource, FetchCache, FetchMode, HashRateSource,
    PriceSource, SentimentSource, BROWSER_UA, PRODUCT_UA,
};
use btclab_core::domain::SeriesPoint;
use btclab_core::fusion::FusionInputs;

use crate::config::ForecastConfig;

/// Raw payloads plus provenance for fingerprinting.
#[derive(Debug)]
pub struct GatheredData {
    /// Source payloads, ready for fusion.
    pub inputs: FusionInputs,
    /// Deterministic BLAKE3 hash over all payload content.
    pub dataset_hash: String,
}

/// Fetch all five sources through the cache, in parallel.
pub fn gather_sources(config: &ForecastConfig, cache: &FetchCache, mode: FetchMode) -> GatheredData {
    // Yahoo rejects the default reqwest UA; the API sources get an
    // honest product identifier instead.
    let chart_client = http_client(BROWSER_UA);
    let api_client = http_client(PRODUCT_UA);

    let price = PriceSource::new(&config.ticker, &config.range);
    let activity_source = ActivitySource::new(&config.activity_repo);
    let hashrate_source = HashRateSource::new(&config.hashrate_timespan);
    let sentiment_source = SentimentSource::new(config.sentiment_limit);
    let cross_source = CrossAssetSource::new(config.cross_assets.clone(), &config.range);

    let mut bars = Vec::new();
    let mut activity = Vec::new();
    let mut hashrate = Vec::new();
    let mut sentiment = Vec::new();
    let mut cross = Vec::new();

    scope(|s| {
        s.spawn(|_| bars = price.fetch(&chart_client, cache, mode));
        s.spawn(|_| activity = activity_source.fetch(&api_client, cache, mode));
        s.spawn(|_| hashrate = hashrate_source.fetch(&api_client, cache, mode));
        s.spawn(|_| sentiment = sentiment_source.fetch(&api_client, cache, mode));
        s.spawn(|_| cross = cross_source.fetch(&chart_client, cache, mode));
    });

    info!(
        bars = bars.len(),
        activity = activity.len(),
        hashrate = hashrate.len(),
        sentiment = sentiment.len(),
        cross = cross.len(),
        "gathered sources"
    );

    let inputs = FusionInputs {
        bars,
        activity,
        hashrate,
        sentiment,
        cross,
    };
    let dataset_hash = compute_dataset_hash(&inputs);

    GatheredData {
        inputs,
        dataset_hash,
    }
}

/// Compute a deterministic BLAKE3 hash over all source payloads.
///
/// Covers dates and values of every series in a fixed source order, so
/// the hash identifies the exact data a forecast was computed from.
pub fn compute_dataset_hash(inputs: &FusionInputs) -> String {
    let mut hasher = blake3::Hasher::new();

    hasher.update(b"bars");
    for bar in &inputs.bars {
        hasher.update(bar.date.to_string().as_bytes());
        hasher.update(&bar.open.to_le_bytes());
        hasher.update(&bar.high.to_le_bytes());
        hasher.update(&bar.low.to_le_bytes());
        hasher.update(&bar.close.to_le_bytes());
        hasher.update(&bar.volume.to_le_bytes());
    }

    hash_series(&mut hasher, "activity", &inputs.activity);
    hash_series(&mut hasher, "hashrate", &inputs.hashrate);
    hash_series(&mut hasher, "sentiment", &inputs.sentiment);
    for (label, points) in &inputs.cross {
        hash_series(&mut hasher, label, points);
    }

    hasher.finalize().to_hex().to_string()
}

fn hash_series(hasher: &mut blake3::Hasher, name: &str, points: &[SeriesPoint]) {
    hasher.update(name.as_bytes());
    for point in points {
        hasher.update(point.date.to_string().as_bytes());
        hasher.update(&point.value.to_le_bytes());
    }
}
