//! Wilder smoothing as a one-step recursive filter.
//!
//! Seed: arithmetic mean of the first `period` inputs.
//! Then: `smoothed = (prev * (period - 1) + current) / period`.
//!
//! The recursion is path-dependent, so the state is carried forward one
//! input at a time instead of being rebuilt from a window.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WilderSmoother {
    period: usize,
    seed: Vec<f64>,
    value: Option<f64>,
}

impl WilderSmoother {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Wilder period must be >= 1");
        Self {
            period,
            seed: Vec::with_capacity(period),
            value: None,
        }
    }

    /// Feed one input. Returns the smoothed value once the seed window is full.
    pub fn push(&mut self, current: f64) -> Option<f64> {
        let p = self.period as f64;
        match self.value {
            Some(prev) => {
                self.value = Some((prev * (p - 1.0) + current) / p);
            }
            None => {
                self.seed.push(current);
                if self.seed.len() == self.period {
                    self.value = Some(self.seed.iter().sum::<f64>() / p);
                    self.seed.clear();
                }
            }
        }
        self.value
    }

    /// Current smoothed value, `None` while the seed window is filling.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
