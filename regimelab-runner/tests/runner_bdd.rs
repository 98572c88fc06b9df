//! BDD tests for the runner: single runs, sweeps, data round trips.

use regimelab_core::{ExitReason, TradingMode};
use regimelab_runner::{
    export_candles_csv, export_sweep_csv, generate_candles, load_candles_csv, run_backtest,
    run_backtest_checked, save_artifacts, FitnessMetric, LoadOptions, ParamGrid, ParamSweep,
    RunConfig, RunError, SyntheticConfig,
};

fn synthetic(count: usize, seed: u64) -> Vec<regimelab_core::Candle> {
    generate_candles(&SyntheticConfig {
        count,
        seed,
        ..SyntheticConfig::default()
    })
}

#[test]
fn bdd_scenario_run_single_backtest_from_toml() {
    // GIVEN a TOML config and synthetic candles
    let config = RunConfig::from_toml(
        r#"
        [screening]
        period = 10
        max_lateral_threshold = 20.0

        [backtest]
        initial_capital = 25000.0
        position_size = 0.25
        "#,
    )
    .expect("config should parse");
    let candles = synthetic(600, 3);

    // WHEN the runner executes the backtest
    let result = run_backtest_checked(&candles, &config).expect("backtest should succeed");

    // THEN the result is keyed by the config and reconciles with its trades
    assert_eq!(result.run_id, config.run_id());
    assert_eq!(result.candle_count, 600);
    assert_eq!(result.equity_curve.len(), 600);
    assert_eq!(result.metrics.initial_capital, 25_000.0);
    let summed: f64 = result.trades.iter().map(|t| t.pnl).sum();
    assert_eq!(result.metrics.final_capital, 25_000.0 + summed);
    assert_eq!(result.metrics.screening_signal_count, result.signals.lateral);
    assert_eq!(
        result.signals.lateral + result.signals.trending + result.signals.absent,
        600
    );
}

#[test]
fn bdd_scenario_holding_cap_forces_exits() {
    // GIVEN a config with a tight holding cap on data with long ranging stretches
    let mut config = RunConfig::default().with_screening(7, 30.0);
    config.backtest.max_holding_period = Some(3);
    let candles = synthetic(500, 11);

    // WHEN the backtest runs
    let result = run_backtest(&candles, &config);

    // THEN no trade lasts longer than the cap
    assert!(result.trades.iter().all(|t| t.bars_held() <= 3));
    // AND every cap exit lasted exactly the cap
    for t in &result.trades {
        if t.exit_reason == ExitReason::MaxHoldingPeriod {
            assert_eq!(t.bars_held(), 3);
        }
    }
}

#[test]
fn bdd_scenario_short_mode_mirrors_long_mode() {
    // GIVEN the same candles and screening, long vs short
    let candles = synthetic(400, 5);
    let long = RunConfig::default().with_screening(7, 25.0);
    let mut short = long.clone();
    short.backtest.trading_mode = TradingMode::Short;

    // WHEN both run
    let long_result = run_backtest(&candles, &long);
    let short_result = run_backtest(&candles, &short);

    // THEN they trade the same candles, with different run IDs
    assert_ne!(long_result.run_id, short_result.run_id);
    let spans = |r: &regimelab_runner::BacktestResult| {
        r.trades
            .iter()
            .map(|t| (t.entry_index, t.exit_index))
            .collect::<Vec<_>>()
    };
    assert_eq!(spans(&long_result), spans(&short_result));
}

#[test]
fn bdd_scenario_invalid_config_rejected() {
    // GIVEN a config with an out-of-range position size
    let mut config = RunConfig::default();
    config.backtest.position_size = 1.5;

    // WHEN the checked runner is called
    let err = run_backtest_checked(&synthetic(100, 1), &config).unwrap_err();

    // THEN it reports a config error
    assert!(matches!(err, RunError::Config(_)));
}

#[test]
fn bdd_scenario_sweep_grid_and_rank() {
    // GIVEN a 3x3 grid over period and threshold
    let candles = synthetic(800, 21);
    let grid = ParamGrid::new(vec![7, 14, 21], vec![15.0, 20.0, 25.0]);
    let base = RunConfig::default();

    // WHEN the sweep runs in parallel
    let results = ParamSweep::new().sweep(&candles, &grid, &base);

    // THEN every grid point produced a result, in grid order
    assert_eq!(results.len(), 9);
    assert_eq!(results.all()[0].screening.period, 7);
    assert_eq!(results.all()[8].screening.period, 21);
    assert_eq!(results.all()[8].screening.max_lateral_threshold, 25.0);

    // AND ranking by total return is best-first
    let top = results.top_n(FitnessMetric::TotalReturn, 3);
    assert_eq!(top.len(), 3);
    assert!(top[0].metrics.total_return_pct >= top[2].metrics.total_return_pct);

    // AND the sweep exports as one CSV row per grid point
    let csv = export_sweep_csv(&results).unwrap();
    assert_eq!(csv.lines().count(), 10);
}

#[test]
fn bdd_scenario_csv_data_roundtrip_and_artifacts() {
    // GIVEN synthetic candles written to a CSV file
    let dir = tempfile::tempdir().unwrap();
    let candles = synthetic(300, 8);
    let data_path = dir.path().join("candles.csv");
    std::fs::write(&data_path, export_candles_csv(&candles).unwrap()).unwrap();

    // WHEN the file is loaded back and backtested
    let loaded = load_candles_csv(&data_path, &LoadOptions::default()).unwrap();
    assert_eq!(loaded.len(), candles.len());
    let config = RunConfig::default().with_screening(7, 20.0);
    let from_file = run_backtest(&loaded, &config);
    let in_memory = run_backtest(&candles, &config);

    // THEN the trade list matches the in-memory run
    assert_eq!(from_file.trades.len(), in_memory.trades.len());
    for (a, b) in from_file.trades.iter().zip(&in_memory.trades) {
        assert_eq!((a.entry_index, a.exit_index), (b.entry_index, b.exit_index));
    }

    // AND artifacts land under the run ID prefix
    let out = save_artifacts(&from_file, &dir.path().join("out")).unwrap();
    assert!(out.join("summary.json").exists());
    assert!(out.to_string_lossy().contains(&from_file.run_id[..12]));
}
