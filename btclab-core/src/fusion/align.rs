//! Calendar alignment of auxiliary series onto the primary index.

use chrono::NaiveDate;

use crate::domain::TimeSeries;

/// As-of join: for each index date take the most recent observation at
/// or before it. Dates before the first observation stay NaN; there is
/// no backward fill.
pub fn join_forward_fill(index: &[NaiveDate], series: &TimeSeries) -> Vec<f64> {
    let points = series.points();
    let mut out = Vec::with_capacity(index.len());
    let mut pos = 0;
    let mut last = f64::NAN;
    for &date in index {
        while pos < points.len() && points[pos].date <= date {
            last = points[pos].value;
            pos += 1;
        }
        out.push(last);
    }
    out
}
