//! ADX — Average Directional Index (Wilder).
//!
//! Steps, per candle in ascending order:
//! 1. True range and directional movement (+DM / -DM) against the previous candle
//! 2. Wilder-smooth TR, +DM and -DM (seeded at index `period`)
//! 3. +DI = 100 * smoothed(+DM) / smoothed(TR), -DI likewise
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI)
//! 5. ADX = Wilder-smoothed DX (seeded once `period` DX values exist)
//!
//! Lookback: 2 * period. A sample exists at index `i` only when the prefix
//! `0..=i` holds at least `2 * period` candles.

use serde::{Deserialize, Serialize};

use super::wilder::WilderSmoother;
use crate::domain::Candle;

/// Full ADX state at one candle index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSample {
    pub true_range: f64,
    pub plus_dm: f64,
    pub minus_dm: f64,
    pub smoothed_tr: f64,
    pub smoothed_plus_dm: f64,
    pub smoothed_minus_dm: f64,
    pub plus_di: f64,
    pub minus_di: f64,
    pub dx: f64,
    pub adx: f64,
}

/// True range of `candle` given the previous candle.
///
/// TR[0] = high - low (no previous close).
/// TR[t] = max(high - low, |high - prev_close|, |low - prev_close|).
pub fn true_range(candle: &Candle, prev: Option<&Candle>) -> f64 {
    let range = candle.high - candle.low;
    match prev {
        None => range,
        Some(p) => range
            .max((candle.high - p.close).abs())
            .max((candle.low - p.close).abs()),
    }
}

/// Directional movement `(+DM, -DM)` of `candle` given the previous candle.
///
/// At most one of the two is nonzero.
pub fn directional_movement(candle: &Candle, prev: Option<&Candle>) -> (f64, f64) {
    let Some(p) = prev else {
        return (0.0, 0.0);
    };
    let high_diff = candle.high - p.high;
    let low_diff = p.low - candle.low;

    let plus_dm = if high_diff > low_diff && high_diff > 0.0 {
        high_diff
    } else {
        0.0
    };
    let minus_dm = if low_diff > high_diff && low_diff > 0.0 {
        low_diff
    } else {
        0.0
    };
    (plus_dm, minus_dm)
}

/// Persistent smoothing state, advanced by exactly one step per candle.
#[derive(Debug, Clone)]
pub struct AdxState {
    period: usize,
    seen: usize,
    prev: Option<Candle>,
    tr: WilderSmoother,
    plus_dm: WilderSmoother,
    minus_dm: WilderSmoother,
    dx: WilderSmoother,
}

impl AdxState {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            seen: 0,
            prev: None,
            tr: WilderSmoother::new(period),
            plus_dm: WilderSmoother::new(period),
            minus_dm: WilderSmoother::new(period),
            dx: WilderSmoother::new(period),
        }
    }

    /// Advance by one candle and return the sample for it, if available.
    pub fn update(&mut self, candle: &Candle) -> Option<IndicatorSample> {
        let prev = self.prev.replace(*candle);
        self.seen += 1;

        // Index 0 has no previous candle and does not enter the smoothing windows.
        let prev = prev?;

        let tr = true_range(candle, Some(&prev));
        let (plus_dm, minus_dm) = directional_movement(candle, Some(&prev));

        let smoothed_tr = self.tr.push(tr);
        let smoothed_plus_dm = self.plus_dm.push(plus_dm);
        let smoothed_minus_dm = self.minus_dm.push(minus_dm);
        let (Some(smoothed_tr), Some(smoothed_plus_dm), Some(smoothed_minus_dm)) =
            (smoothed_tr, smoothed_plus_dm, smoothed_minus_dm)
        else {
            return None;
        };

        let (plus_di, minus_di) = if smoothed_tr == 0.0 {
            (0.0, 0.0)
        } else {
            (
                100.0 * smoothed_plus_dm / smoothed_tr,
                100.0 * smoothed_minus_dm / smoothed_tr,
            )
        };

        let di_sum = plus_di + minus_di;
        let dx = if di_sum == 0.0 {
            0.0
        } else {
            100.0 * (plus_di - minus_di).abs() / di_sum
        };

        let adx = self.dx.push(dx);

        if self.seen < 2 * self.period {
            return None;
        }

        Some(IndicatorSample {
            true_range: tr,
            plus_dm,
            minus_dm,
            smoothed_tr,
            smoothed_plus_dm,
            smoothed_minus_dm,
            plus_di,
            minus_di,
            dx,
            // Reported as 0 until the DX seed window is full.
            adx: adx.unwrap_or(0.0),
        })
    }
}

/// ADX indicator over a whole candle series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self { period }
    }

    pub fn name(&self) -> String {
        format!("adx_{}", self.period)
    }

    /// Number of candles needed before the first sample.
    pub fn lookback(&self) -> usize {
        2 * self.period
    }

    /// Fresh smoothing state for incremental evaluation.
    pub fn state(&self) -> AdxState {
        AdxState::new(self.period)
    }

    /// One sample (or absence) per candle, in a single left-to-right pass.
    pub fn compute(&self, candles: &[Candle]) -> Vec<Option<IndicatorSample>> {
        if candles.len() < self.lookback() {
            return vec![None; candles.len()];
        }
        let mut state = self.state();
        candles.iter().map(|c| state.update(c)).collect()
    }

    /// Sample at `index`, computed from the prefix `0..=index` only.
    pub fn sample_at(&self, candles: &[Candle], index: usize) -> Option<IndicatorSample> {
        if index >= candles.len() || index + 1 < self.lookback() {
            return None;
        }
        let mut state = self.state();
        let mut last = None;
        for candle in &candles[..=index] {
            last = state.update(candle);
        }
        last
    }
}
