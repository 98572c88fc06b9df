//! Trade simulation — single-position state machine over a signal series.
//!
//! Per candle, in ascending order:
//! 1. Holding: close on a non-lateral signal or when the holding period elapses
//! 2. Flat: open on a lateral signal (same-candle close fill)
//! 3. After the last candle: force-close any open position

pub mod costs;
pub mod simulator;

pub use costs::CostModel;
pub use simulator::{simulate, PositionState, SimulationResult, TradeSimulator};
