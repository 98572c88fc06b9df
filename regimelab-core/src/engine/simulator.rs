//! Candle-by-candle trade simulator.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{BacktestConfig, TradingMode};
use crate::domain::{Candle, ExitReason, Position, PositionSide, Trade};
use crate::screening::ScreeningSignal;

use super::costs::CostModel;

/// Position state between candles. At most one position is ever open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionState {
    NoPosition,
    Holding(Position),
}

impl PositionState {
    pub fn is_open(&self) -> bool {
        matches!(self, PositionState::Holding(_))
    }
}

/// Output of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Completed round trips, in close order.
    pub trades: Vec<Trade>,
    /// Realized capital after each candle (one point per candle).
    pub equity_curve: Vec<f64>,
    /// Initial capital followed by capital after each trade close.
    pub capital_trace: Vec<f64>,
    /// `initial_capital + Σ trade.pnl`, summed in trade order. Equal to the
    /// last point of `capital_trace` and `equity_curve`.
    pub final_capital: f64,
    pub peak_capital: f64,
    /// Largest peak-to-trough decline of realized capital, in currency.
    pub max_drawdown: f64,
}

/// Running capital and drawdown accumulators for one run.
struct Ledger {
    capital: f64,
    peak: f64,
    max_drawdown: f64,
    trades: Vec<Trade>,
    capital_trace: Vec<f64>,
}

impl Ledger {
    fn new(initial_capital: f64) -> Self {
        Self {
            capital: initial_capital,
            peak: initial_capital,
            max_drawdown: 0.0,
            trades: Vec::new(),
            capital_trace: vec![initial_capital],
        }
    }

    fn record(&mut self, trade: Trade) {
        self.capital += trade.pnl;
        self.peak = self.peak.max(self.capital);
        self.max_drawdown = self.max_drawdown.max(self.peak - self.capital);
        self.capital_trace.push(self.capital);
        self.trades.push(trade);
    }
}

/// Simulator bound to one immutable backtest configuration.
#[derive(Debug, Clone, Copy)]
pub struct TradeSimulator {
    config: BacktestConfig,
    costs: CostModel,
}

impl TradeSimulator {
    pub fn new(config: BacktestConfig) -> Self {
        Self {
            config,
            costs: CostModel::from_config(&config),
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Side opened by a lateral signal under the configured trading mode.
    pub fn entry_side(&self) -> PositionSide {
        match self.config.trading_mode {
            TradingMode::Long | TradingMode::Both => PositionSide::Long,
            TradingMode::Short => PositionSide::Short,
        }
    }

    /// Run the state machine over `candles`, reading `signals[i]` for candle `i`.
    ///
    /// Missing signal entries (a shorter `signals` slice) count as "no signal".
    pub fn run(&self, candles: &[Candle], signals: &[Option<ScreeningSignal>]) -> SimulationResult {
        let mut ledger = Ledger::new(self.config.initial_capital);
        let mut equity_curve = Vec::with_capacity(candles.len());
        let mut state = PositionState::NoPosition;
        let last = candles.len().saturating_sub(1);

        for (i, candle) in candles.iter().enumerate() {
            let signal = signals.get(i).copied().flatten();

            state = match state {
                PositionState::Holding(position) => match self.exit_reason(&position, i, signal) {
                    Some(reason) => {
                        ledger.record(self.close(&position, i, candle, reason, ledger.capital));
                        PositionState::NoPosition
                    }
                    None => PositionState::Holding(position),
                },
                PositionState::NoPosition => {
                    // An entry on the final candle could never close on a later one.
                    if i < last && matches!(signal, Some(s) if s.is_lateral) {
                        PositionState::Holding(self.open(i, candle))
                    } else {
                        PositionState::NoPosition
                    }
                }
            };

            equity_curve.push(ledger.capital);
        }

        if let PositionState::Holding(position) = state {
            let candle = &candles[last];
            ledger.record(self.close(&position, last, candle, ExitReason::EndOfData, ledger.capital));
            if let Some(point) = equity_curve.last_mut() {
                *point = ledger.capital;
            }
        }

        SimulationResult {
            trades: ledger.trades,
            equity_curve,
            capital_trace: ledger.capital_trace,
            final_capital: ledger.capital,
            peak_capital: ledger.peak,
            max_drawdown: ledger.max_drawdown,
        }
    }

    fn exit_reason(
        &self,
        position: &Position,
        index: usize,
        signal: Option<ScreeningSignal>,
    ) -> Option<ExitReason> {
        if matches!(signal, Some(s) if !s.is_lateral) {
            return Some(ExitReason::SignalFlip);
        }
        match self.config.max_holding_period {
            Some(max_bars) if position.bars_held(index) >= max_bars => {
                Some(ExitReason::MaxHoldingPeriod)
            }
            _ => None,
        }
    }

    fn open(&self, index: usize, candle: &Candle) -> Position {
        let side = self.entry_side();
        let position = Position {
            side,
            entry_index: index,
            entry_price: self.costs.entry_fill(side, candle.close),
            entry_time: candle.timestamp,
        };
        debug!(
            index,
            %side,
            price = position.entry_price,
            "opened position"
        );
        position
    }

    fn close(
        &self,
        position: &Position,
        index: usize,
        candle: &Candle,
        reason: ExitReason,
        capital: f64,
    ) -> Trade {
        let exit_price = self.costs.exit_fill(position.side, candle.close);
        let pnl_percent = self
            .costs
            .net_return(position.side, position.entry_price, exit_price);
        let pnl = capital * self.config.position_size * pnl_percent;
        debug!(
            entry = position.entry_index,
            exit = index,
            ?reason,
            pnl,
            "closed position"
        );
        Trade {
            side: position.side,
            entry_index: position.entry_index,
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_index: index,
            exit_time: candle.timestamp,
            exit_price,
            exit_reason: reason,
            pnl,
            pnl_percent,
        }
    }
}

/// Simulate one run. Pure: no I/O, no shared state.
pub fn simulate(
    candles: &[Candle],
    signals: &[Option<ScreeningSignal>],
    config: &BacktestConfig,
) -> SimulationResult {
    TradeSimulator::new(*config).run(candles, signals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Candle::new(i as i64 * 1_000, c, c + 1.0, c - 1.0, c))
            .collect()
    }

    fn lateral(adx: f64) -> Option<ScreeningSignal> {
        Some(ScreeningSignal {
            adx_value: adx,
            is_lateral: true,
            timestamp: 0,
        })
    }

    fn trending(adx: f64) -> Option<ScreeningSignal> {
        Some(ScreeningSignal {
            adx_value: adx,
            is_lateral: false,
            timestamp: 0,
        })
    }

    fn frictionless(mode: TradingMode) -> BacktestConfig {
        BacktestConfig {
            commission_rate: 0.0,
            slippage_rate: 0.0,
            trading_mode: mode,
            ..BacktestConfig::default()
        }
    }

    #[test]
    fn no_signals_no_trades() {
        let candles = candles_from_closes(&[100.0, 101.0, 102.0]);
        let result = simulate(&candles, &[None, None, None], &BacktestConfig::default());
        assert!(result.trades.is_empty());
        assert_eq!(result.final_capital, 10_000.0);
        assert_eq!(result.equity_curve, vec![10_000.0; 3]);
        assert_eq!(result.capital_trace, vec![10_000.0]);
        assert_eq!(result.max_drawdown, 0.0);
    }

    #[test]
    fn empty_input() {
        let result = simulate(&[], &[], &BacktestConfig::default());
        assert!(result.trades.is_empty());
        assert!(result.equity_curve.is_empty());
        assert_eq!(result.final_capital, 10_000.0);
    }

    #[test]
    fn long_round_trip_on_signal_flip() {
        let candles = candles_from_closes(&[100.0, 100.0, 105.0, 110.0]);
        let signals = [None, lateral(10.0), lateral(12.0), trending(30.0)];
        let result = simulate(&candles, &signals, &frictionless(TradingMode::Long));

        assert_eq!(result.trades.len(), 1);
        let t = &result.trades[0];
        assert_eq!(t.side, PositionSide::Long);
        assert_eq!((t.entry_index, t.exit_index), (1, 3));
        assert_eq!(t.exit_reason, ExitReason::SignalFlip);
        assert!((t.pnl_percent - 0.1).abs() < 1e-12);
        assert!((t.pnl - 10_000.0 * 0.1 * 0.1).abs() < 1e-9);
        assert_eq!(result.equity_curve[2], 10_000.0);
        assert!((result.equity_curve[3] - 10_100.0).abs() < 1e-9);
    }

    #[test]
    fn short_profits_from_decline() {
        let candles = candles_from_closes(&[100.0, 100.0, 90.0]);
        let signals = [lateral(5.0), None, trending(40.0)];
        let result = simulate(&candles, &signals, &frictionless(TradingMode::Short));
        let t = &result.trades[0];
        assert_eq!(t.side, PositionSide::Short);
        assert_eq!((t.entry_index, t.exit_index), (0, 2));
        assert!((t.pnl_percent - 0.1).abs() < 1e-12);
        assert!(t.is_winner());
    }

    #[test]
    fn both_mode_opens_long() {
        let candles = candles_from_closes(&[100.0, 100.0, 100.0]);
        let signals = [lateral(5.0), None, None];
        let result = simulate(&candles, &signals, &frictionless(TradingMode::Both));
        assert_eq!(result.trades[0].side, PositionSide::Long);
    }

    #[test]
    fn slippage_applied_in_opposite_directions() {
        let candles = candles_from_closes(&[100.0, 100.0]);
        let config = BacktestConfig {
            slippage_rate: 0.01,
            commission_rate: 0.0,
            ..BacktestConfig::default()
        };
        let result = simulate(&candles, &[lateral(5.0), trending(50.0)], &config);
        let t = &result.trades[0];
        assert!((t.entry_price - 101.0).abs() < 1e-9);
        assert!((t.exit_price - 99.0).abs() < 1e-9);
        assert!(t.pnl < 0.0);
    }

    #[test]
    fn two_sided_commission_on_flat_trade() {
        let candles = candles_from_closes(&[100.0, 100.0, 100.0]);
        let config = BacktestConfig {
            commission_rate: 0.01,
            slippage_rate: 0.0,
            ..BacktestConfig::default()
        };
        let result = simulate(&candles, &[lateral(5.0), lateral(5.0), trending(20.0)], &config);
        let t = &result.trades[0];
        assert!((t.pnl_percent + 0.02).abs() < 1e-12);
        assert!((t.pnl - 10_000.0 * 0.1 * -0.02).abs() < 1e-9);
    }

    #[test]
    fn max_holding_period_forces_exit() {
        let candles = candles_from_closes(&[100.0; 10]);
        let signals = vec![lateral(5.0); 10];
        let config = BacktestConfig {
            max_holding_period: Some(3),
            ..frictionless(TradingMode::Long)
        };
        let result = simulate(&candles, &signals, &config);

        // 0→3, (re-entry next candle) 4→7, 8→9 forced at end of data
        let spans: Vec<(usize, usize)> = result
            .trades
            .iter()
            .map(|t| (t.entry_index, t.exit_index))
            .collect();
        assert_eq!(spans, vec![(0, 3), (4, 7), (8, 9)]);
        assert_eq!(result.trades[0].exit_reason, ExitReason::MaxHoldingPeriod);
        assert_eq!(result.trades[2].exit_reason, ExitReason::EndOfData);
        assert!(result.trades.iter().all(|t| t.bars_held() <= 3));
    }

    #[test]
    fn no_entry_on_last_candle() {
        let candles = candles_from_closes(&[100.0, 100.0, 100.0]);
        let signals = [None, None, lateral(5.0)];
        let result = simulate(&candles, &signals, &BacktestConfig::default());
        assert!(result.trades.is_empty());
    }

    #[test]
    fn forced_close_at_last_candle() {
        let candles = candles_from_closes(&[100.0, 102.0, 104.0]);
        let signals = [lateral(5.0), lateral(5.0), lateral(5.0)];
        let result = simulate(&candles, &signals, &frictionless(TradingMode::Long));
        assert_eq!(result.trades.len(), 1);
        let t = &result.trades[0];
        assert_eq!((t.entry_index, t.exit_index), (0, 2));
        assert_eq!(t.exit_reason, ExitReason::EndOfData);
        assert_eq!(*result.equity_curve.last().unwrap(), result.capital_trace[1]);
    }

    #[test]
    fn drawdown_tracks_peak_to_trough() {
        // win +10%, then lose -20%, then win +5% (all at 100% sizing)
        let candles = candles_from_closes(&[100.0, 110.0, 100.0, 80.0, 100.0, 105.0]);
        let signals = [
            lateral(1.0),
            trending(30.0),
            lateral(1.0),
            trending(30.0),
            lateral(1.0),
            trending(30.0),
        ];
        let config = BacktestConfig {
            position_size: 1.0,
            ..frictionless(TradingMode::Long)
        };
        let result = simulate(&candles, &signals, &config);
        assert_eq!(result.trades.len(), 3);
        // 10000 → 11000 → 8800 → 9240
        assert!((result.peak_capital - 11_000.0).abs() < 1e-6);
        assert!((result.max_drawdown - 2_200.0).abs() < 1e-6);
        assert!((result.capital_trace[3] - 9_240.0).abs() < 1e-6);
    }

    #[test]
    fn reconciliation_is_exact() {
        let candles = candles_from_closes(&[100.0, 103.0, 99.0, 101.0, 97.0, 104.0]);
        let signals = [
            lateral(1.0),
            trending(30.0),
            lateral(1.0),
            trending(30.0),
            lateral(1.0),
            None,
        ];
        let config = BacktestConfig::default();
        let result = simulate(&candles, &signals, &config);
        assert_eq!(result.trades.len(), 3);
        let reconciled = result
            .trades
            .iter()
            .fold(config.initial_capital, |capital, t| capital + t.pnl);
        assert_eq!(result.final_capital, reconciled);
        assert_eq!(result.capital_trace.last(), Some(&result.final_capital));
        assert_eq!(result.equity_curve.last(), Some(&result.final_capital));
    }

    #[test]
    fn short_signal_slice_is_no_signal() {
        let candles = candles_from_closes(&[100.0, 100.0, 100.0, 100.0]);
        let result = simulate(&candles, &[lateral(1.0)], &BacktestConfig::default());
        assert_eq!(result.trades.len(), 1);
        assert_eq!(result.trades[0].exit_index, 3);
    }

    #[test]
    fn position_state_reports_open() {
        assert!(!PositionState::NoPosition.is_open());
        let pos = Position {
            side: PositionSide::Long,
            entry_index: 0,
            entry_price: 1.0,
            entry_time: 0,
        };
        assert!(PositionState::Holding(pos).is_open());
    }
}
