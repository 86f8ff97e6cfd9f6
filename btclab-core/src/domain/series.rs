//! Date-indexed value series — the auxiliary-source data unit.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One observation in a [`TimeSeries`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named series of daily observations.
///
/// Invariant: dates are strictly increasing and unique. The constructor
/// enforces this by sorting and collapsing duplicates (last observation
/// wins), so downstream alignment can binary-search and forward-fill
/// without re-checking order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    points: Vec<SeriesPoint>,
}

impl TimeSeries {
    /// Build a series from raw observations, sorting and deduplicating.
    ///
    /// Non-finite values are dropped: adapters deliver emptiness, not NaN.
    pub fn new(name: impl Into<String>, mut points: Vec<SeriesPoint>) -> Self {
        points.retain(|p| p.value.is_finite());
        points.sort_by_key(|p| p.date);
        points.dedup_by(|next, prev| {
            if next.date == prev.date {
                prev.value = next.value;
                true
            } else {
                false
            }
        });
        Self {
            name: name.into(),
            points,
        }
    }

    /// An empty series — the adapter failure signal.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Log returns of this series on its own calendar: ln(v_t / v_{t-1}).
    ///
    /// The first observation has no predecessor and is skipped, so the
    /// result has one point fewer. Non-positive values yield no point.
    pub fn log_returns(&self, name: impl Into<String>) -> TimeSeries {
        let mut out = Vec::with_capacity(self.points.len().saturating_sub(1));
        for pair in self.points.windows(2) {
            let (prev, cur) = (pair[0], pair[1]);
            if prev.value > 0.0 && cur.value > 0.0 {
                out.push(SeriesPoint {
                    date: cur.date,
                    value: (cur.value / prev.value).ln(),
                });
            }
        }
        TimeSeries::new(name, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(d: u32, v: f64) -> SeriesPoint {
        SeriesPoint {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            value: v,
        }
    }

    #[test]
    fn new_sorts_and_dedups_last_wins() {
        let s = TimeSeries::new("activity", vec![pt(3, 7.0), pt(2, 5.0), pt(3, 9.0)]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.points()[0].value, 5.0);
        assert_eq!(s.points()[1].value, 9.0);
    }

    #[test]
    fn new_drops_non_finite() {
        let s = TimeSeries::new("hashrate", vec![pt(2, f64::NAN), pt(3, 1.0)]);
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn empty_series_is_empty() {
        assert!(TimeSeries::empty("sentiment").is_empty());
    }

    #[test]
    fn log_returns_on_own_calendar() {
        let s = TimeSeries::new("gold", vec![pt(2, 100.0), pt(4, 110.0), pt(5, 99.0)]);
        let r = s.log_returns("gold_return");
        assert_eq!(r.len(), 2);
        assert_eq!(r.points()[0].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert!((r.points()[0].value - (1.1f64).ln()).abs() < 1e-12);
        assert!((r.points()[1].value - (99.0f64 / 110.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn log_returns_skip_non_positive() {
        let s = TimeSeries::new("x", vec![pt(2, 100.0), pt(3, 0.0), pt(4, 50.0)]);
        assert!(s.log_returns("x_return").is_empty());
    }
}
