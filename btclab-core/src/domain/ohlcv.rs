//! OHLCV bar — the primary-source data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily OHLCV bar for a single instrument.
///
/// Crypto series trade continuously, so there is no adjusted-close column:
/// `close` is the value every derived feature works from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high bounds low/open/close, prices positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close > 0.0
    }
}

/// Sort bars by date ascending and drop void or insane bars.
///
/// Duplicate dates keep the last occurrence. This is the canonicalization
/// step every primary-source payload passes through before fusion.
pub fn canonicalize_bars(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.retain(|b| b.is_sane());
    bars.sort_by_key(|b| b.date);
    bars.dedup_by(|next, prev| {
        if next.date == prev.date {
            // last observation wins
            *prev = next.clone();
            true
        } else {
            false
        }
    });
    bars
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(y: i32, m: u32, d: u32, close: f64) -> OhlcvBar {
        OhlcvBar {
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            open: close - 1.0,
            high: close + 2.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    #[test]
    fn sane_bar_passes() {
        assert!(bar(2024, 1, 2, 100.0).is_sane());
    }

    #[test]
    fn nan_close_is_void() {
        let mut b = bar(2024, 1, 2, 100.0);
        b.close = f64::NAN;
        assert!(b.is_void());
        assert!(!b.is_sane());
    }

    #[test]
    fn inverted_high_low_is_insane() {
        let mut b = bar(2024, 1, 2, 100.0);
        b.high = b.low - 1.0;
        assert!(!b.is_sane());
    }

    #[test]
    fn canonicalize_sorts_and_dedups() {
        let bars = vec![
            bar(2024, 1, 3, 101.0),
            bar(2024, 1, 2, 100.0),
            bar(2024, 1, 3, 102.0),
        ];
        let canon = canonicalize_bars(bars);
        assert_eq!(canon.len(), 2);
        assert_eq!(canon[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        // duplicate date: last occurrence wins
        assert_eq!(canon[1].close, 102.0);
    }

    #[test]
    fn canonicalize_drops_void_bars() {
        let mut void = bar(2024, 1, 4, 100.0);
        void.open = f64::NAN;
        let canon = canonicalize_bars(vec![bar(2024, 1, 2, 100.0), void]);
        assert_eq!(canon.len(), 1);
    }
}
