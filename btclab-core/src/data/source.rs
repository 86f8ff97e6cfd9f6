//! Shared adapter plumbing: error type, HTTP client, JSON fetch.
//!
//! Every source adapter follows the same contract: one network attempt
//! per run, typed errors internally, and an empty payload (never a
//! panic or a propagated error) at the public boundary. The conversion
//! from error to emptiness lives in `cache::fetch_cached`, which also
//! owns the fresh-hit / stale-fallback policy.

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Errors raised inside source adapters and the fetch cache.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("{source}: HTTP status {status}")]
    HttpStatus { r#source: &'static str, status: u16 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("{source}: no usable observations in response")]
    NoData { r#source: &'static str },

    #[error("cache error: {0}")]
    Cache(String),
}

/// Whether a fetch may touch the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Online,
    /// Serve from cache regardless of age; never issue a request.
    Offline,
}

/// Build the blocking HTTP client shared by all adapters of one source.
///
/// Yahoo endpoints reject requests without a browser-looking user agent,
/// so that is the default; API-style sources pass their own.
pub fn http_client(user_agent: &str) -> reqwest::blocking::Client {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(user_agent)
        .build()
        .expect("failed to build HTTP client")
}

/// Browser user agent for Yahoo chart endpoints.
pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Product user agent for API-style sources (GitHub requires one).
pub const PRODUCT_UA: &str = concat!("btclab/", env!("CARGO_PKG_VERSION"));

/// One GET request, JSON-decoded. No retry: a failed attempt surfaces
/// as emptiness at the adapter boundary.
pub fn get_json<T: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    source: &'static str,
    url: &str,
) -> Result<T, SourceError> {
    send_json(client.get(url), source)
}

/// GET with an explicit Accept header; GitHub's API versioning wants one.
pub fn get_json_accept<T: DeserializeOwned>(
    client: &reqwest::blocking::Client,
    source: &'static str,
    url: &str,
    accept: &str,
) -> Result<T, SourceError> {
    send_json(client.get(url).header(reqwest::header::ACCEPT, accept), source)
}

fn send_json<T: DeserializeOwned>(
    request: reqwest::blocking::RequestBuilder,
    source: &'static str,
) -> Result<T, SourceError> {
    let resp = request
        .send()
        .map_err(|e| SourceError::NetworkUnreachable(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(SourceError::HttpStatus {
            source,
            status: status.as_u16(),
        });
    }

    resp.json::<T>()
        .map_err(|e| SourceError::ResponseFormatChanged(format!("{source}: {e}")))
}
