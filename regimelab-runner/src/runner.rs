//! Backtest runner — wires together screening, simulation, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: trusts its inputs. Used by sweeps over pre-validated data.
//! - `run_backtest_checked()`: validates config and candles first. Used by the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use regimelab_core::{
    simulate, validate_candles, BacktestConfig, Candle, CandleError, ConfigError, LateralScreen,
    ScreeningConfig, ScreeningSignal, Trade,
};

use crate::config::{RunConfig, RunId};
use crate::metrics::PerformanceMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] CandleError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// How a run's candles were classified by the screening rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalCounts {
    pub lateral: usize,
    pub trending: usize,
    /// Warmup candles (and discarded zero readings) with no signal.
    pub absent: usize,
}

impl SignalCounts {
    pub fn from_signals(signals: &[Option<ScreeningSignal>]) -> Self {
        signals.iter().fold(Self::default(), |mut counts, signal| {
            match signal {
                Some(s) if s.is_lateral => counts.lateral += 1,
                Some(_) => counts.trending += 1,
                None => counts.absent += 1,
            }
            counts
        })
    }
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub screening: ScreeningConfig,
    pub backtest: BacktestConfig,
    pub candle_count: usize,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
    pub signals: SignalCounts,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    /// Realized capital after each candle.
    pub equity_curve: Vec<f64>,
    /// Initial capital followed by capital after each trade.
    pub capital_trace: Vec<f64>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one backtest over pre-loaded candles. No I/O, no validation.
///
/// Panics if `config.screening.period` is 0; use `run_backtest_checked` for
/// untrusted configs.
pub fn run_backtest(candles: &[Candle], config: &RunConfig) -> BacktestResult {
    let run_id = config.run_id();
    let screen = LateralScreen::new(config.screening);
    let signals = screen.screen_all(candles);
    let counts = SignalCounts::from_signals(&signals);

    let sim = simulate(candles, &signals, &config.backtest);
    let metrics = PerformanceMetrics::compute(
        &sim.trades,
        sim.final_capital,
        sim.max_drawdown,
        LateralScreen::count_lateral(&signals),
        config.backtest.initial_capital,
    );

    info!(
        run_id = &run_id[..12],
        period = config.screening.period,
        threshold = config.screening.max_lateral_threshold,
        trades = metrics.total_trades,
        final_capital = metrics.final_capital,
        "backtest complete"
    );

    BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        screening: config.screening,
        backtest: config.backtest,
        candle_count: candles.len(),
        first_timestamp: candles.first().map(|c| c.timestamp),
        last_timestamp: candles.last().map(|c| c.timestamp),
        signals: counts,
        metrics,
        trades: sim.trades,
        equity_curve: sim.equity_curve,
        capital_trace: sim.capital_trace,
    }
}

/// Validate config and candles, then run.
pub fn run_backtest_checked(
    candles: &[Candle],
    config: &RunConfig,
) -> Result<BacktestResult, RunError> {
    config.validate()?;
    validate_candles(candles)?;
    Ok(run_backtest(candles, config))
}
