//! Log returns: ln(v[t] / v[t-1]).
//!
//! The first element has no predecessor and is NaN. Non-positive or NaN
//! inputs make the affected return NaN rather than ±inf.

/// Compute one-step log returns over a value series.
pub fn log_returns(values: &[f64]) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    for i in 1..values.len() {
        let prev = values[i - 1];
        let cur = values[i];
        if prev > 0.0 && cur > 0.0 && prev.is_finite() && cur.is_finite() {
            out[i] = (cur / prev).ln();
        }
    }
    out
}
