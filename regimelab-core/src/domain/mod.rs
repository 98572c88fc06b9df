//! Domain types for RegimeLab

pub mod candle;
pub mod position;
pub mod trade;

pub use candle::{validate_candles, Candle, CandleError};
pub use position::{Position, PositionSide};
pub use trade::{ExitReason, Trade};
