//! RegimeLab Core — candles, ADX, lateral-market screening, trade simulation.
//!
//! This crate contains the numeric engine:
//! - Domain types (candles, positions, trades)
//! - ADX indicator with a persistent one-step Wilder smoothing state
//! - Lateral-market screening rule built on ADX
//! - Single-position trade simulator with slippage and commission
//! - Immutable screening/backtest configuration records
//!
//! Data flows one way: candles → indicator samples → screening signals → trades.

pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod screening;

pub use config::{BacktestConfig, ConfigError, ScreeningConfig, TradingMode};
pub use domain::{validate_candles, Candle, CandleError, ExitReason, Position, PositionSide, Trade};
pub use engine::{simulate, CostModel, PositionState, SimulationResult, TradeSimulator};
pub use indicators::{Adx, AdxState, IndicatorSample};
pub use screening::{LateralScreen, ScreeningSignal};
