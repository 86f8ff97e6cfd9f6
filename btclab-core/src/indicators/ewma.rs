//! Span-parameterized exponentially weighted moving average.
//!
//! Weighted-history form: the output at t is the weighted average of all
//! observations up to t with weights (1 - alpha)^k, alpha = 2/(span+1).
//! Defined from the first finite observation on — no fixed warm-up
//! window, so a short auxiliary history still yields usable values.
//! NaN gaps do not reset the average; their positions carry the running
//! value forward while the decay keeps acting.

/// EWMA over a value series with the given span (span >= 1).
pub fn ewma_span(values: &[f64], span: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if span == 0 || n == 0 {
        return out;
    }
    let alpha = 2.0 / (span as f64 + 1.0);
    let decay = 1.0 - alpha;

    let mut num = 0.0;
    let mut den = 0.0;
    let mut seen = false;
    for (i, &x) in values.iter().enumerate() {
        if x.is_finite() {
            num = x + decay * num;
            den = 1.0 + decay * den;
            seen = true;
        } else if seen {
            num *= decay;
            den *= decay;
        }
        if seen && den > 0.0 {
            out[i] = num / den;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn first_observation_passes_through() {
        let e = ewma_span(&[10.0], 7);
        assert_approx(e[0], 10.0, DEFAULT_EPSILON);
    }

    #[test]
    fn two_point_weighted_average() {
        // span 3 -> alpha 0.5: (2 + 0.5 * 1) / (1 + 0.5) = 5/3
        let e = ewma_span(&[1.0, 2.0], 3);
        assert_approx(e[1], 5.0 / 3.0, DEFAULT_EPSILON);
    }

    #[test]
    fn constant_series_is_identity() {
        let e = ewma_span(&[4.0; 10], 7);
        for v in e {
            assert_approx(v, 4.0, DEFAULT_EPSILON);
        }
    }

    #[test]
    fn leading_nans_stay_nan() {
        let e = ewma_span(&[f64::NAN, f64::NAN, 3.0, 4.0], 7);
        assert!(e[0].is_nan());
        assert!(e[1].is_nan());
        assert_approx(e[2], 3.0, DEFAULT_EPSILON);
        assert!(e[3].is_finite());
    }

    #[test]
    fn interior_nan_carries_value_forward() {
        // span 3 -> alpha 0.5; gap decays history but adds no observation
        let e = ewma_span(&[2.0, f64::NAN, 6.0], 3);
        assert_approx(e[1], 2.0, DEFAULT_EPSILON);
        // weights: 6 at lag 0 (w=1), 2 at lag 2 (w=0.25)
        assert_approx(e[2], (6.0 + 0.25 * 2.0) / 1.25, DEFAULT_EPSILON);
    }

    #[test]
    fn converges_toward_recent_level() {
        let mut v = vec![0.0; 50];
        v.extend(vec![10.0; 50]);
        let e = ewma_span(&v, 7);
        assert!((e[99] - 10.0).abs() < 1e-5);
    }
}
