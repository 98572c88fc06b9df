//! Reporting and export — JSON, CSV, and Markdown artifact generation.
//!
//! All persisted JSON carries a `schema_version` field. Unknown versions are
//! rejected on load. Candle timestamps are written as RFC 3339 (UTC) where a
//! human reads them and as raw milliseconds where a loader reads them back.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat};

use regimelab_core::{Candle, Trade};

use crate::config::RunConfig;
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::sweep::SweepResults;

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// RFC 3339 rendering of an epoch-millisecond timestamp; raw value if out of range.
pub fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Export a trade list as CSV.
///
/// Columns: side, entry_index, entry_time, entry_price, exit_index,
/// exit_time, exit_price, exit_reason, bars_held, pnl, pnl_percent
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "side",
        "entry_index",
        "entry_time",
        "entry_price",
        "exit_index",
        "exit_time",
        "exit_price",
        "exit_reason",
        "bars_held",
        "pnl",
        "pnl_percent",
    ])?;

    for t in trades {
        wtr.write_record([
            &t.side.to_string(),
            &t.entry_index.to_string(),
            &format_timestamp(t.entry_time),
            &format!("{:.6}", t.entry_price),
            &t.exit_index.to_string(),
            &format_timestamp(t.exit_time),
            &format!("{:.6}", t.exit_price),
            &format!("{:?}", t.exit_reason),
            &t.bars_held().to_string(),
            &format!("{:.2}", t.pnl),
            &format!("{:.6}", t.pnl_percent),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the per-candle realized equity curve.
pub fn export_equity_csv(equity_curve: &[f64]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["candle_index", "equity"])?;
    for (i, eq) in equity_curve.iter().enumerate() {
        wtr.write_record([&i.to_string(), &format!("{:.2}", eq)])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export candles in the format `parse_candles_csv` reads.
pub fn export_candles_csv(candles: &[Candle]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for candle in candles {
        wtr.serialize(candle)?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per sweep grid point, in grid order.
pub fn export_sweep_csv(results: &SweepResults) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "run_id",
        "period",
        "max_lateral_threshold",
        "lateral_candles",
        "trades",
        "win_rate",
        "total_return_pct",
        "profit_factor",
        "sharpe_ratio",
        "max_drawdown",
        "max_drawdown_pct",
    ])?;

    for r in results.all() {
        let m = &r.metrics;
        wtr.write_record([
            &r.run_id,
            &r.screening.period.to_string(),
            &r.screening.max_lateral_threshold.to_string(),
            &r.signals.lateral.to_string(),
            &m.total_trades.to_string(),
            &format!("{:.4}", m.win_rate),
            &format!("{:.4}", m.total_return_pct),
            &format!("{:.4}", m.profit_factor),
            &format!("{:.4}", m.sharpe_ratio),
            &format!("{:.2}", m.max_drawdown),
            &format!("{:.4}", m.max_drawdown_pct),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates `{run_id prefix}/` under `output_dir` containing:
/// - `summary.json` — the full `BacktestResult`
/// - `trades.csv` — trade tape
/// - `equity.csv` — candle-by-candle realized equity
/// - `config.toml` — the run configuration, loadable with `--config`
/// - `report.md` — human-readable summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let prefix_len = result.run_id.len().min(12);
    let run_dir = output_dir.join(&result.run_id[..prefix_len]);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("summary.json"), export_json(result)?)?;
    std::fs::write(run_dir.join("trades.csv"), export_trades_csv(&result.trades)?)?;
    std::fs::write(run_dir.join("equity.csv"), export_equity_csv(&result.equity_curve)?)?;

    let config = RunConfig {
        screening: result.screening,
        backtest: result.backtest,
        sweep: None,
    };
    std::fs::write(run_dir.join("config.toml"), config.to_toml()?)?;
    std::fs::write(run_dir.join("report.md"), generate_report(result))?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's summary.json.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let path = dir.join("summary.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown report ────────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n|---|---|\n");
    let _ = writeln!(md, "| Run ID | `{}` |", result.run_id);
    let _ = writeln!(md, "| ADX period | {} |", result.screening.period);
    let _ = writeln!(
        md,
        "| Lateral threshold | {} |",
        result.screening.max_lateral_threshold
    );
    let _ = writeln!(md, "| Trading mode | {} |", result.backtest.trading_mode);
    let _ = writeln!(
        md,
        "| Max holding | {} |",
        result
            .backtest
            .max_holding_period
            .map_or_else(|| "unlimited".to_string(), |h| h.to_string())
    );
    let _ = writeln!(md, "| Candles | {} |", result.candle_count);
    if let (Some(first), Some(last)) = (result.first_timestamp, result.last_timestamp) {
        let _ = writeln!(
            md,
            "| Period | {} to {} |",
            format_timestamp(first),
            format_timestamp(last)
        );
    }
    let _ = writeln!(
        md,
        "| Signals | {} lateral / {} trending / {} absent |",
        result.signals.lateral, result.signals.trending, result.signals.absent
    );

    md.push_str("\n## Performance\n\n");
    md.push_str("| Metric | Value |\n|---|---|\n");
    let _ = writeln!(md, "| Initial capital | {:.2} |", m.initial_capital);
    let _ = writeln!(md, "| Final capital | {:.2} |", m.final_capital);
    let _ = writeln!(md, "| Total return | {:.2}% |", m.total_return_pct);
    let _ = writeln!(
        md,
        "| Trades | {} ({} won, {} lost) |",
        m.total_trades, m.winning_trades, m.losing_trades
    );
    let _ = writeln!(md, "| Win rate | {:.1}% |", m.win_rate * 100.0);
    let _ = writeln!(md, "| Average win | {:.2} |", m.average_win);
    let _ = writeln!(md, "| Average loss | {:.2} |", m.average_loss);
    let _ = writeln!(md, "| Profit factor | {:.2} |", m.profit_factor);
    let _ = writeln!(
        md,
        "| Max drawdown | {:.2} ({:.2}%) |",
        m.max_drawdown, m.max_drawdown_pct
    );
    let _ = writeln!(md, "| Sharpe (per trade) | {:.3} |", m.sharpe_ratio);
    let _ = writeln!(
        md,
        "| Screening success rate | {:.2}% |",
        m.screening_success_rate
    );
    let _ = writeln!(md, "| Average bars held | {:.1} |", m.average_bars_held);

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::run_backtest;
    use crate::synthetic::{generate_candles, SyntheticConfig};
    use regimelab_core::{ExitReason, PositionSide};

    // ─── Test helpers ────────────────────────────────────────────────

    fn sample_trade() -> Trade {
        Trade {
            side: PositionSide::Short,
            entry_index: 30,
            entry_time: 1_704_067_200_000,
            entry_price: 101.5,
            exit_index: 42,
            exit_time: 1_704_110_400_000,
            exit_price: 99.25,
            exit_reason: ExitReason::MaxHoldingPeriod,
            pnl: 21.3,
            pnl_percent: 0.0201,
        }
    }

    fn sample_result() -> BacktestResult {
        let candles = generate_candles(&SyntheticConfig {
            count: 300,
            ..SyntheticConfig::default()
        });
        run_backtest(&candles, &RunConfig::default().with_screening(7, 20.0))
    }

    // ─── JSON ────────────────────────────────────────────────────────

    #[test]
    fn json_roundtrip() {
        let result = sample_result();
        let json = export_json(&result).unwrap();
        let back = import_json(&json).unwrap();
        assert_eq!(back.run_id, result.run_id);
        assert_eq!(back.trades.len(), result.trades.len());
        assert_eq!(back.signals, result.signals);
    }

    #[test]
    fn rejects_future_schema() {
        let mut result = sample_result();
        result.schema_version = SCHEMA_VERSION + 1;
        let json = serde_json::to_string(&result).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults() {
        let result = sample_result();
        let mut value = serde_json::to_value(&result).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let back = import_json(&value.to_string()).unwrap();
        assert_eq!(back.schema_version, SCHEMA_VERSION);
    }

    // ─── CSV ─────────────────────────────────────────────────────────

    #[test]
    fn timestamps_render_rfc3339() {
        assert_eq!(format_timestamp(1_704_067_200_000), "2024-01-01T00:00:00Z");
        assert_eq!(format_timestamp(i64::MAX), i64::MAX.to_string());
    }

    #[test]
    fn trades_csv_columns() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "side,entry_index,entry_time,entry_price,exit_index,exit_time,exit_price,exit_reason,bars_held,pnl,pnl_percent"
        );
        assert_eq!(
            lines.next().unwrap(),
            "short,30,2024-01-01T00:00:00Z,101.500000,42,2024-01-01T12:00:00Z,99.250000,MaxHoldingPeriod,12,21.30,0.020100"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn equity_csv_has_row_per_candle() {
        let csv = export_equity_csv(&[10_000.0, 10_000.0, 10_125.5]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "candle_index,equity");
        assert_eq!(lines[3], "2,10125.50");
    }

    #[test]
    fn candles_csv_reloads() {
        use crate::data_loader::{parse_candles_csv, LoadOptions};

        let candles = vec![
            Candle::new(1_000, 10.0, 11.0, 9.5, 10.5),
            Candle::new(2_000, 10.5, 12.0, 10.0, 11.75),
        ];
        let csv = export_candles_csv(&candles).unwrap();
        assert!(csv.starts_with("timestamp,open,high,low,close\n"));
        let back = parse_candles_csv(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(back, candles);
    }

    // ─── Artifacts ───────────────────────────────────────────────────

    #[test]
    fn save_and_load_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let result = sample_result();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert!(run_dir.ends_with(&result.run_id[..12]));
        for file in ["summary.json", "trades.csv", "equity.csv", "config.toml", "report.md"] {
            assert!(run_dir.join(file).exists(), "missing {file}");
        }

        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.run_id, result.run_id);

        let config = RunConfig::from_file(&run_dir.join("config.toml")).unwrap();
        assert_eq!(config.run_id(), result.run_id);
    }

    #[test]
    fn report_mentions_key_figures() {
        let result = sample_result();
        let report = generate_report(&result);
        assert!(report.starts_with("# Backtest Report"));
        assert!(report.contains(&result.run_id));
        assert!(report.contains("| ADX period | 7 |"));
        assert!(report.contains("Screening success rate"));
    }
}
