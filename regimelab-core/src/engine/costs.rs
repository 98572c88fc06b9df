//! Cost model — slippage on fills and round-trip commission on returns.
//!
//! Slippage is directional: buyers pay more, sellers receive less.
//! Commission is charged per side as a fraction of notional, so a round trip
//! costs `2 * commission_rate` off the trade's fractional return.

use crate::config::BacktestConfig;
use crate::domain::PositionSide;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub slippage_rate: f64,
    pub commission_rate: f64,
}

impl CostModel {
    pub fn new(slippage_rate: f64, commission_rate: f64) -> Self {
        Self {
            slippage_rate,
            commission_rate,
        }
    }

    pub fn from_config(config: &BacktestConfig) -> Self {
        Self::new(config.slippage_rate, config.commission_rate)
    }

    /// Fill price when opening `side` at `price`: long buys, short sells.
    pub fn entry_fill(&self, side: PositionSide, price: f64) -> f64 {
        match side {
            PositionSide::Long => price * (1.0 + self.slippage_rate),
            PositionSide::Short => price * (1.0 - self.slippage_rate),
        }
    }

    /// Fill price when closing `side` at `price`: long sells, short buys back.
    pub fn exit_fill(&self, side: PositionSide, price: f64) -> f64 {
        match side {
            PositionSide::Long => price * (1.0 - self.slippage_rate),
            PositionSide::Short => price * (1.0 + self.slippage_rate),
        }
    }

    /// Fractional return of a round trip between two fills, net of commission.
    pub fn net_return(&self, side: PositionSide, entry_fill: f64, exit_fill: f64) -> f64 {
        side.raw_return(entry_fill, exit_fill) - self.commission_rate * 2.0
    }
}
