//! Position — an open exposure between entry and exit.

use serde::{Deserialize, Serialize};

/// Direction of an open exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    /// Fractional return from `entry` to `exit` for this side, before costs.
    pub fn raw_return(self, entry: f64, exit: f64) -> f64 {
        if entry == 0.0 {
            return 0.0;
        }
        match self {
            PositionSide::Long => (exit - entry) / entry,
            PositionSide::Short => (entry - exit) / entry,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

/// An open exposure. The entry price is already slippage-adjusted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub side: PositionSide,
    pub entry_index: usize,
    pub entry_price: f64,
    pub entry_time: i64,
}

impl Position {
    pub fn bars_held(&self, current_index: usize) -> usize {
        current_index.saturating_sub(self.entry_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_raw_return() {
        assert!((PositionSide::Long.raw_return(100.0, 110.0) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn short_raw_return() {
        assert!((PositionSide::Short.raw_return(100.0, 90.0) - 0.1).abs() < 1e-12);
        assert!((PositionSide::Short.raw_return(100.0, 110.0) + 0.1).abs() < 1e-12);
    }

    #[test]
    fn zero_entry_is_guarded() {
        assert_eq!(PositionSide::Long.raw_return(0.0, 10.0), 0.0);
    }

    #[test]
    fn bars_held_counts_from_entry() {
        let pos = Position {
            side: PositionSide::Long,
            entry_index: 12,
            entry_price: 100.0,
            entry_time: 0,
        };
        assert_eq!(pos.bars_held(12), 0);
        assert_eq!(pos.bars_held(17), 5);
    }
}
