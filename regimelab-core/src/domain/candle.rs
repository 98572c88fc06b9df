//! Candle — the fundamental market data unit.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC price bar.
///
/// `timestamp` is an epoch-style integer (milliseconds in everything this
/// workspace produces). A series is ordered by timestamp ascending and is
/// never mutated once handed to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
        }
    }

    /// Returns true if every OHLC field is a finite number.
    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }

    /// Basic OHLC sanity check: high >= low, high >= open/close, low <= open/close.
    pub fn is_sane(&self) -> bool {
        if !self.is_finite() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Reasons a candle series is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CandleError {
    #[error("candle {index}: non-finite OHLC value")]
    NonFinite { index: usize },
    #[error("candle {index}: inconsistent range (high={high}, low={low})")]
    InvertedRange { index: usize, high: f64, low: f64 },
    #[error("candle {index}: timestamp {timestamp} does not follow previous timestamp {previous}")]
    NonMonotonic {
        index: usize,
        timestamp: i64,
        previous: i64,
    },
}

/// Validate a candle series before it reaches the engine.
///
/// The engine itself assumes well-formed input; this is the optional check
/// data loaders and the runner apply at the boundary.
pub fn validate_candles(candles: &[Candle]) -> Result<(), CandleError> {
    let mut previous: Option<i64> = None;
    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_finite() {
            return Err(CandleError::NonFinite { index });
        }
        if !candle.is_sane() {
            return Err(CandleError::InvertedRange {
                index,
                high: candle.high,
                low: candle.low,
            });
        }
        if let Some(prev) = previous {
            if candle.timestamp <= prev {
                return Err(CandleError::NonMonotonic {
                    index,
                    timestamp: candle.timestamp,
                    previous: prev,
                });
            }
        }
        previous = Some(candle.timestamp);
    }
    Ok(())
}
