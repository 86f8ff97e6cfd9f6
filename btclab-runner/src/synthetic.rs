//! Synthetic source payloads for offline development and tests.
//!
//! Generates a deterministic random-walk stand-in for every source.
//! Seeds derive from the ticker and source name via BLAKE3, so the same
//! config always produces the same payloads and different tickers
//! diverge. Results computed on synthetic data are tagged and must not
//! be mistaken for market output.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use btclab_core::domain::{OhlcvBar, SeriesPoint};
use btclab_core::fusion::FusionInputs;

use crate::config::ForecastConfig;

/// Number of calendar days a relative range string covers.
///
/// Understands the chart API's suffixes ("2y", "6mo", "90d"); anything
/// else falls back to two years.
pub fn range_days(range: &str) -> usize {
    let parse = |prefix: &str| prefix.parse::<usize>().ok();
    if let Some(n) = range.strip_suffix("mo").and_then(parse) {
        return n * 30;
    }
    if let Some(n) = range.strip_suffix('y').and_then(parse) {
        return n * 365;
    }
    if let Some(n) = range.strip_suffix('d').and_then(parse) {
        return n;
    }
    730
}

/// Generate a full set of synthetic source payloads ending at `end`.
pub fn synthetic_inputs(config: &ForecastConfig, end: NaiveDate) -> FusionInputs {
    let days = range_days(&config.range);
    let start = end - Duration::days(days as i64 - 1);

    let cross = config
        .cross_assets
        .iter()
        .map(|asset| {
            let returns = synthetic_returns(&config.ticker, &asset.label, start, end);
            (asset.label.clone(), returns)
        })
        .collect();

    FusionInputs {
        bars: synthetic_bars(&config.ticker, start, end),
        activity: synthetic_counts(&config.ticker, start, end),
        hashrate: synthetic_hashrate(&config.ticker, start, end),
        sentiment: synthetic_sentiment(&config.ticker, start, end),
        cross,
    }
}

/// Deterministic RNG for one source of one ticker.
fn seeded_rng(ticker: &str, source: &str) -> StdRng {
    let hash = blake3::hash(format!("{ticker}:{source}").as_bytes());
    StdRng::from_seed(*hash.as_bytes())
}

/// Daily OHLCV random walk. Crypto trades every calendar day, so no
/// weekend gaps here.
fn synthetic_bars(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<OhlcvBar> {
    let mut rng = seeded_rng(ticker, "price");
    let mut bars = Vec::new();
    let mut price = 30_000.0_f64;
    let mut current = start;

    while current <= end {
        let daily_return: f64 = rng.gen_range(-0.04..0.04);
        let open = price;
        let close = price * (1.0 + daily_return);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
        let volume = rng.gen_range(5.0e9..4.0e10);

        bars.push(OhlcvBar {
            date: current,
            open,
            high,
            low,
            close,
            volume,
        });

        price = close;
        current += Duration::days(1);
    }

    bars
}

fn synthetic_counts(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<SeriesPoint> {
    let mut rng = seeded_rng(ticker, "activity");
    calendar_series(start, end, |_| f64::from(rng.gen_range(0..60_u32)))
}

fn synthetic_hashrate(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<SeriesPoint> {
    let mut rng = seeded_rng(ticker, "hashrate");
    let mut level = 6.0e20_f64;
    calendar_series(start, end, |_| {
        level *= 1.0 + rng.gen_range(-0.02..0.021);
        level
    })
}

fn synthetic_sentiment(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<SeriesPoint> {
    let mut rng = seeded_rng(ticker, "sentiment");
    let mut score = 50.0_f64;
    calendar_series(start, end, |_| {
        score = (score + rng.gen_range(-6.0..6.0)).clamp(0.0, 100.0);
        score
    })
}

/// Cross-asset return series on a weekday calendar, so fusion has the
/// same gaps to forward-fill as with real equity data.
fn synthetic_returns(
    ticker: &str,
    label: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<SeriesPoint> {
    let mut rng = seeded_rng(ticker, label);
    let mut points = Vec::new();
    let mut current = start;
    while current <= end {
        let weekday = current.weekday();
        if weekday != Weekday::Sat && weekday != Weekday::Sun {
            points.push(SeriesPoint {
                date: current,
                value: rng.gen_range(-0.03..0.03),
            });
        }
        current += Duration::days(1);
    }
    points
}

fn calendar_series(
    start: NaiveDate,
    end: NaiveDate,
    mut value: impl FnMut(NaiveDate) -> f64,
) -> Vec<SeriesPoint> {
    let mut points = Vec::new();
    let mut current = start;
    while current <= end {
        points.push(SeriesPoint {
            date: current,
            value: value(current),
        });
        current += Duration::days(1);
    }
    points
}
