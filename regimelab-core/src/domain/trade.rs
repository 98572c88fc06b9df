//! Trade — a closed exposure, written once when a position is closed.

use super::position::PositionSide;
use serde::{Deserialize, Serialize};

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// The screening signal turned non-lateral.
    SignalFlip,
    /// `max_holding_period` bars elapsed since entry.
    MaxHoldingPeriod,
    /// Forced close on the final candle.
    EndOfData,
}

/// A complete round trip: entry → exit.
///
/// `entry_price` / `exit_price` are slippage-adjusted fills. `pnl_percent` is
/// the side-aware fractional return net of round-trip commission, and `pnl`
/// is that return applied to the capital allocated at entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: PositionSide,

    // ── Entry ──
    pub entry_index: usize,
    pub entry_time: i64,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_index: usize,
    pub exit_time: i64,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── PnL ──
    pub pnl: f64,
    pub pnl_percent: f64,
}

impl Trade {
    pub fn bars_held(&self) -> usize {
        self.exit_index - self.entry_index
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn is_loser(&self) -> bool {
        self.pnl < 0.0
    }
}
