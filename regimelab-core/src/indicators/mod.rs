//! Indicator implementations.
//!
//! Indicators are evaluated by carrying a smoothing state forward one candle
//! at a time, so a full-series evaluation is a single linear pass.

pub mod adx;
pub mod wilder;

pub use adx::{directional_movement, true_range, Adx, AdxState, IndicatorSample};
pub use wilder::WilderSmoother;

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
