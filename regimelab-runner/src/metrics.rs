//! Performance metrics — pure functions over a simulated trade list.
//!
//! Every metric is a pure function: trades (and a few capital figures) in,
//! scalar out. Degenerate inputs resolve to documented conventions, never
//! errors: 0 for empty sets and zero variance, `+inf` profit factor when
//! there is profit and no loss.

use serde::{Deserialize, Serialize};

use regimelab_core::Trade;

/// Aggregate statistics for a single backtest run.
///
/// Loss aggregates (`gross_loss`, `average_loss`, `largest_loss`) are positive
/// magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_capital: f64,
    pub final_capital: f64,
    pub total_return_pct: f64,

    // ── Trade counts ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Fraction in [0, 1].
    pub win_rate: f64,

    // ── Win / loss aggregates ──
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub average_win: f64,
    pub average_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    #[serde(with = "unbounded_f64")]
    pub profit_factor: f64,

    // ── Risk ──
    pub max_drawdown: f64,
    pub max_drawdown_pct: f64,
    pub sharpe_ratio: f64,

    // ── Screening ──
    pub screening_signal_count: usize,
    /// `100 × winning_trades / screening_signal_count`.
    pub screening_success_rate: f64,

    // ── Holding ──
    pub average_bars_held: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
}

impl PerformanceMetrics {
    /// Aggregate a finished run.
    ///
    /// `max_drawdown` is the simulator's peak-to-trough decline in currency;
    /// `screening_signal_count` is the number of lateral candles.
    pub fn compute(
        trades: &[Trade],
        final_capital: f64,
        max_drawdown: f64,
        screening_signal_count: usize,
        initial_capital: f64,
    ) -> Self {
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = trades.iter().filter(|t| t.is_loser()).count();
        let gross_profit = gross_profit(trades);
        let gross_loss = gross_loss(trades);

        Self {
            initial_capital,
            final_capital,
            total_return_pct: total_return_pct(initial_capital, final_capital),
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate: win_rate(trades),
            gross_profit,
            gross_loss,
            average_win: ratio_or_zero(gross_profit, winning_trades),
            average_loss: ratio_or_zero(gross_loss, losing_trades),
            largest_win: largest_win(trades),
            largest_loss: largest_loss(trades),
            profit_factor: profit_factor(gross_profit, gross_loss),
            max_drawdown,
            max_drawdown_pct: max_drawdown_pct(max_drawdown, initial_capital),
            sharpe_ratio: sharpe_ratio(trades),
            screening_signal_count,
            screening_success_rate: screening_success_rate(winning_trades, screening_signal_count),
            average_bars_held: average_bars_held(trades),
            max_consecutive_wins: max_consecutive(trades, Trade::is_winner),
            max_consecutive_losses: max_consecutive(trades, Trade::is_loser),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return in percent: 100 × (final − initial) / initial.
pub fn total_return_pct(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    100.0 * (final_capital - initial_capital) / initial_capital
}

/// Win rate: fraction of trades with positive pnl.
pub fn win_rate(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Sum of positive pnl.
pub fn gross_profit(trades: &[Trade]) -> f64 {
    trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).sum()
}

/// Sum of |pnl| over losing trades.
pub fn gross_loss(trades: &[Trade]) -> f64 {
    trades.iter().filter(|t| t.is_loser()).map(|t| t.pnl.abs()).sum()
}

pub fn largest_win(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.pnl)
        .fold(0.0, f64::max)
}

pub fn largest_loss(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.is_loser())
        .map(|t| t.pnl.abs())
        .fold(0.0, f64::max)
}

/// Profit factor: gross profit / gross loss.
///
/// `+inf` when there are profits and no losses; 0 when both are 0.
pub fn profit_factor(gross_profit: f64, gross_loss: f64) -> f64 {
    if gross_loss == 0.0 {
        return if gross_profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    gross_profit / gross_loss
}

/// Drawdown as a percent of initial capital.
pub fn max_drawdown_pct(max_drawdown: f64, initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    max_drawdown / initial_capital * 100.0
}

/// Per-trade Sharpe-like ratio: mean(pnl_percent) / sample std(pnl_percent).
///
/// Not annualized and no risk-free rate. 0 with fewer than 2 trades or zero
/// dispersion.
pub fn sharpe_ratio(trades: &[Trade]) -> f64 {
    if trades.len() < 2 {
        return 0.0;
    }
    let returns: Vec<f64> = trades.iter().map(|t| t.pnl_percent).collect();
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    mean_f64(&returns) / std
}

/// Winning trades per 100 lateral candles.
pub fn screening_success_rate(winning_trades: usize, screening_signal_count: usize) -> f64 {
    if screening_signal_count == 0 {
        return 0.0;
    }
    100.0 * winning_trades as f64 / screening_signal_count as f64
}

pub fn average_bars_held(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.bars_held()).sum::<usize>() as f64 / trades.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

pub(crate) fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1).
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn ratio_or_zero(total: f64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Longest run of consecutive trades matching `pred`. Break-even trades end
/// both kinds of streak.
fn max_consecutive(trades: &[Trade], pred: fn(&Trade) -> bool) -> usize {
    let mut max_streak = 0;
    let mut current = 0;

    for trade in trades {
        if pred(trade) {
            current += 1;
            max_streak = max_streak.max(current);
        } else {
            current = 0;
        }
    }
    max_streak
}

/// JSON has no infinity literal; write non-finite values as strings.
mod unbounded_f64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str("inf")
        } else if *value == f64::NEG_INFINITY {
            serializer.serialize_str("-inf")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                other => Err(de::Error::custom(format!("invalid float '{other}'"))),
            },
        }
    }
}
