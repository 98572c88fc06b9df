//! Lateral-market screening — thresholds ADX into a per-candle regime signal.
//!
//! A candle is *lateral* (ranging) when its ADX is at or below
//! `max_lateral_threshold`. Candles with fewer than `2 * period` prior candles
//! produce no signal at all; absence is `None`, never a sentinel value. A
//! computed ADX of exactly 0 is also "no signal" unless `discard_zero_adx` is
//! turned off.

use serde::{Deserialize, Serialize};

use crate::config::ScreeningConfig;
use crate::domain::Candle;
use crate::indicators::{Adx, IndicatorSample};

/// Regime classification at one candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningSignal {
    pub adx_value: f64,
    pub is_lateral: bool,
    pub timestamp: i64,
}

/// Screening rule bound to one immutable configuration.
#[derive(Debug, Clone, Copy)]
pub struct LateralScreen {
    config: ScreeningConfig,
    adx: Adx,
}

impl LateralScreen {
    pub fn new(config: ScreeningConfig) -> Self {
        Self {
            config,
            adx: Adx::new(config.period),
        }
    }

    pub fn config(&self) -> &ScreeningConfig {
        &self.config
    }

    /// First index that can carry a signal.
    pub fn first_signal_index(&self) -> usize {
        2 * self.config.period
    }

    /// Signal for a single candle index, using only candles `0..=index`.
    pub fn screen(&self, candles: &[Candle], index: usize) -> Option<ScreeningSignal> {
        if index < self.first_signal_index() || index >= candles.len() {
            return None;
        }
        let sample = self.adx.sample_at(candles, index)?;
        self.classify(&sample, candles[index].timestamp)
    }

    /// One signal (or absence) per candle, in order. Linear in `candles.len()`.
    pub fn screen_all(&self, candles: &[Candle]) -> Vec<Option<ScreeningSignal>> {
        let first = self.first_signal_index();
        self.adx
            .compute(candles)
            .into_iter()
            .zip(candles)
            .enumerate()
            .map(|(i, (sample, candle))| {
                if i < first {
                    return None;
                }
                sample.and_then(|s| self.classify(&s, candle.timestamp))
            })
            .collect()
    }

    /// Number of lateral candles in a signal series.
    pub fn count_lateral(signals: &[Option<ScreeningSignal>]) -> usize {
        signals
            .iter()
            .filter(|s| matches!(s, Some(sig) if sig.is_lateral))
            .count()
    }

    fn classify(&self, sample: &IndicatorSample, timestamp: i64) -> Option<ScreeningSignal> {
        let adx_value = sample.adx;
        if self.config.discard_zero_adx && adx_value == 0.0 {
            return None;
        }
        Some(ScreeningSignal {
            adx_value,
            is_lateral: adx_value <= self.config.max_lateral_threshold,
            timestamp,
        })
    }
}
