//! RegimeLab Runner — backtest orchestration, metrics, sweeps, data I/O.
//!
//! This crate builds on `regimelab-core` to provide:
//! - Metrics aggregation over a simulated trade list
//! - Single-run orchestration (screen → simulate → aggregate)
//! - TOML run configuration with content-addressed run IDs
//! - Parallel `(period, threshold)` parameter sweeps
//! - CSV candle loading and seeded synthetic candle generation
//! - JSON/CSV result export

pub mod config;
pub mod data_loader;
pub mod export;
pub mod fitness;
pub mod metrics;
pub mod runner;
pub mod sweep;
pub mod synthetic;

pub use config::{FileConfigError, RunConfig, RunId};
pub use data_loader::{load_candles_csv, parse_candles_csv, LoadError, LoadOptions};
pub use export::{
    export_candles_csv, export_equity_csv, export_json, export_sweep_csv, export_trades_csv,
    import_json, save_artifacts,
};
pub use fitness::FitnessMetric;
pub use metrics::PerformanceMetrics;
pub use runner::{run_backtest, run_backtest_checked, BacktestResult, RunError, SignalCounts};
pub use sweep::{ParamGrid, ParamSweep, SweepResults};
pub use synthetic::{generate_candles, SyntheticConfig};
