//! Typed, immutable run parameters for screening and simulation.
//!
//! Each run builds its own config values; nothing here is mutated in place,
//! so parameter sweeps can run in parallel without sharing state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid configuration values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("period must be >= 1")]
    ZeroPeriod,
    #[error("max_lateral_threshold must be a finite, non-negative number (got {0})")]
    InvalidThreshold(f64),
    #[error("initial_capital must be finite and > 0 (got {0})")]
    InvalidCapital(f64),
    #[error("position_size must be in (0, 1] (got {0})")]
    InvalidPositionSize(f64),
    #[error("{name} must be finite and >= 0 (got {value})")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("max_holding_period must be >= 1 when set")]
    ZeroHoldingPeriod,
}

/// Which side a lateral signal opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingMode {
    #[default]
    Long,
    Short,
    /// Opens longs on lateral signals, same as `Long`.
    Both,
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Long => write!(f, "long"),
            TradingMode::Short => write!(f, "short"),
            TradingMode::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for TradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(TradingMode::Long),
            "short" => Ok(TradingMode::Short),
            "both" => Ok(TradingMode::Both),
            other => Err(format!("unknown trading mode '{other}' (expected long, short or both)")),
        }
    }
}

/// Screening rule parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    pub period: usize,
    pub max_lateral_threshold: f64,
    /// Treat a computed ADX of exactly 0 as "no signal". When `false`, only
    /// warmup candles are absent and a zero reading is lateral.
    pub discard_zero_adx: bool,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            period: 14,
            max_lateral_threshold: 15.0,
            discard_zero_adx: true,
        }
    }
}

impl ScreeningConfig {
    pub fn new(period: usize, max_lateral_threshold: f64) -> Self {
        Self {
            period,
            max_lateral_threshold,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if !self.max_lateral_threshold.is_finite() || self.max_lateral_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.max_lateral_threshold));
        }
        Ok(())
    }
}

/// Trade simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    /// Fraction of running capital allocated per trade, in (0, 1].
    pub position_size: f64,
    /// Per-side commission as a fraction of notional.
    pub commission_rate: f64,
    /// Per-side slippage as a fraction of price.
    pub slippage_rate: f64,
    /// Force exit after this many bars; `None` = unlimited.
    pub max_holding_period: Option<usize>,
    pub trading_mode: TradingMode,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            position_size: 0.1,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            max_holding_period: None,
            trading_mode: TradingMode::Long,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::InvalidCapital(self.initial_capital));
        }
        if !self.position_size.is_finite() || self.position_size <= 0.0 || self.position_size > 1.0
        {
            return Err(ConfigError::InvalidPositionSize(self.position_size));
        }
        for (name, value) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidRate { name, value });
            }
        }
        if self.max_holding_period == Some(0) {
            return Err(ConfigError::ZeroHoldingPeriod);
        }
        Ok(())
    }
}
