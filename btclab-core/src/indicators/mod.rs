//! Series-level feature primitives.
//!
//! All functions take an f64 slice and return a vector of the same
//! length, with `NaN` marking warm-up or propagated gaps. The fusion
//! engine computes every derived column through these, then drops the
//! rows that still hold `NaN`.

pub mod ewma;
pub mod returns;
pub mod rolling;

pub use ewma::ewma_span;
pub use returns::log_returns;
pub use rolling::{rolling_mean, rolling_std, rolling_zscore};

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
