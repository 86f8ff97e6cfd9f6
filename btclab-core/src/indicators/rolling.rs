//! Rolling window statistics: mean, sample standard deviation, z-score.
//!
//! Full-window semantics: the output is NaN until the window is filled,
//! and any NaN inside the window makes the output NaN. The standard
//! deviation uses the sample (n - 1) denominator.

/// Rolling mean over a fixed window.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window == 0 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().all(|v| v.is_finite()) {
            out[i] = slice.iter().sum::<f64>() / window as f64;
        }
    }
    out
}

/// Rolling sample standard deviation over a fixed window.
///
/// A window of 1 has no sample variance and yields all NaN.
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if window < 2 || n < window {
        return out;
    }
    for i in (window - 1)..n {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().all(|v| v.is_finite()) {
            let mean = slice.iter().sum::<f64>() / window as f64;
            let ss: f64 = slice.iter().map(|v| (v - mean) * (v - mean)).sum();
            out[i] = (ss / (window as f64 - 1.0)).sqrt();
        }
    }
    out
}

/// Rolling z-score: (x - rolling_mean) / rolling_std, same window for both.
///
/// A zero or non-finite standard deviation yields NaN, not ±inf.
pub fn rolling_zscore(values: &[f64], window: usize) -> Vec<f64> {
    let means = rolling_mean(values, window);
    let stds = rolling_std(values, window);
    values
        .iter()
        .zip(means.iter().zip(stds.iter()))
        .map(|(&x, (&m, &s))| {
            if x.is_finite() && m.is_finite() && s.is_finite() && s > 0.0 {
                (x - m) / s
            } else {
                f64::NAN
            }
        })
        .collect()
}
