//! Source adapters and the fetch cache

pub mod activity;
pub mod cache;
pub mod crossasset;
pub mod hashrate;
pub mod price;
pub mod sentiment;
pub mod source;

pub use activity::{ActivitySource, ACTIVITY_TTL_SECS};
pub use cache::{fetch_cached, CacheEntryStatus, CacheKey, CacheMeta, FetchCache};
pub use crossasset::{default_cross_assets, CrossAsset, CrossAssetSource, CROSS_TTL_SECS};
pub use hashrate::{HashRateSource, HASHRATE_TTL_SECS};
pub use price::{PriceSource, PRICE_TTL_SECS};
pub use sentiment::{SentimentSource, SENTIMENT_TTL_SECS};
pub use source::{http_client, FetchMode, SourceError, BROWSER_UA, PRODUCT_UA};
