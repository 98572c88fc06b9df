//! RegimeLab CLI — backtest, sweep, and data generation commands.
//!
//! Commands:
//! - `run` — screen and simulate one configuration over CSV or synthetic candles
//! - `sweep` — grid search over `(period, threshold)` pairs, ranked by a metric
//! - `generate` — write seeded synthetic candles to CSV
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr so
//! stdout carries only the summary.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use regimelab_core::{Candle, TradingMode};
use regimelab_runner::export::format_timestamp;
use regimelab_runner::{
    export_candles_csv, export_sweep_csv, generate_candles, load_candles_csv,
    run_backtest_checked, save_artifacts, BacktestResult, FitnessMetric, LoadOptions, ParamGrid,
    ParamSweep, RunConfig, SweepResults, SyntheticConfig,
};

#[derive(Parser)]
#[command(
    name = "regimelab",
    about = "RegimeLab CLI — ADX lateral-market screening and backtesting"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest.
    Run {
        #[command(flatten)]
        source: DataSource,

        /// Path to a TOML run config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the ADX period.
        #[arg(long)]
        period: Option<usize>,

        /// Override the lateral threshold.
        #[arg(long)]
        threshold: Option<f64>,

        /// Override the trading mode (long, short, both).
        #[arg(long)]
        mode: Option<TradingMode>,

        /// Override the maximum holding period, in candles.
        #[arg(long)]
        max_hold: Option<usize>,

        /// Write summary.json, trades.csv, equity.csv under this directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Sweep a grid of ADX periods and thresholds.
    Sweep {
        #[command(flatten)]
        source: DataSource,

        /// Path to a TOML run config; its [sweep] section supplies the grid.
        #[arg(long)]
        config: Option<PathBuf>,

        /// ADX periods, comma separated (overrides the config grid).
        #[arg(long, value_delimiter = ',')]
        periods: Vec<usize>,

        /// Lateral thresholds, comma separated (overrides the config grid).
        #[arg(long, value_delimiter = ',')]
        thresholds: Vec<f64>,

        /// Run grid points one after another instead of in parallel.
        #[arg(long, default_value_t = false)]
        sequential: bool,

        /// Ranking metric: total_return, profit_factor, sharpe, win_rate, max_drawdown.
        #[arg(long, default_value = "total_return")]
        rank_by: FitnessMetric,

        /// Number of ranked results to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// Write one CSV row per grid point to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Generate synthetic candles and write them as CSV.
    Generate {
        /// Number of candles.
        #[arg(long, default_value_t = 1000)]
        count: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Candles per ranging/trending regime.
        #[arg(long, default_value_t = 60)]
        regime_length: usize,

        /// Output CSV path.
        #[arg(long)]
        out: PathBuf,
    },
}

/// Where candles come from: a CSV file or the synthetic generator.
#[derive(Args)]
struct DataSource {
    /// CSV file with timestamp,open,high,low,close columns.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Generate this many synthetic candles instead of reading a file.
    #[arg(long)]
    synthetic: Option<usize>,

    /// Seed for --synthetic.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Drop malformed rows from --data instead of failing.
    #[arg(long, default_value_t = false)]
    skip_invalid: bool,
}

impl DataSource {
    fn load(&self) -> Result<Vec<Candle>> {
        match (&self.data, self.synthetic) {
            (Some(_), Some(_)) => bail!("--data and --synthetic are mutually exclusive"),
            (None, None) => bail!("one of --data or --synthetic is required"),
            (Some(path), None) => {
                let opts = LoadOptions {
                    skip_invalid: self.skip_invalid,
                };
                load_candles_csv(path, &opts)
                    .with_context(|| format!("failed to load candles from {}", path.display()))
            }
            (None, Some(count)) => Ok(generate_candles(&SyntheticConfig {
                count,
                seed: self.seed,
                ..SyntheticConfig::default()
            })),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            source,
            config,
            period,
            threshold,
            mode,
            max_hold,
            output_dir,
        } => {
            let mut run_config = load_config(config.as_deref())?;
            if let Some(p) = period {
                run_config.screening.period = p;
            }
            if let Some(t) = threshold {
                run_config.screening.max_lateral_threshold = t;
            }
            if let Some(m) = mode {
                run_config.backtest.trading_mode = m;
            }
            if max_hold.is_some() {
                run_config.backtest.max_holding_period = max_hold;
            }
            run_cmd(&source, &run_config, output_dir.as_deref())
        }
        Commands::Sweep {
            source,
            config,
            periods,
            thresholds,
            sequential,
            rank_by,
            top,
            output,
        } => {
            let run_config = load_config(config.as_deref())?;
            let mut grid = run_config.sweep.clone().unwrap_or_default();
            if !periods.is_empty() {
                grid.periods = periods;
            }
            if !thresholds.is_empty() {
                grid.thresholds = thresholds;
            }
            sweep_cmd(
                &source,
                &run_config,
                &grid,
                !sequential,
                rank_by,
                top,
                output.as_deref(),
            )
        }
        Commands::Generate {
            count,
            seed,
            regime_length,
            out,
        } => generate_cmd(count, seed, regime_length, &out),
    }
}

fn load_config(path: Option<&Path>) -> Result<RunConfig> {
    match path {
        Some(p) => RunConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(RunConfig::default()),
    }
}

fn run_cmd(source: &DataSource, config: &RunConfig, output_dir: Option<&Path>) -> Result<()> {
    let candles = source.load()?;
    let result = run_backtest_checked(&candles, config)?;

    print_summary(&result);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn sweep_cmd(
    source: &DataSource,
    base: &RunConfig,
    grid: &ParamGrid,
    parallel: bool,
    rank_by: FitnessMetric,
    top: usize,
    output: Option<&Path>,
) -> Result<()> {
    if grid.size() == 0 {
        bail!("sweep grid is empty: pass --periods and --thresholds or a [sweep] config section");
    }
    base.backtest.validate()?;
    let candles = source.load()?;
    info!(points = grid.size(), candles = candles.len(), "starting sweep");

    let results = ParamSweep::new()
        .with_parallelism(parallel)
        .sweep(&candles, grid, base);

    print_ranking(&results, rank_by, top);

    if let Some(path) = output {
        std::fs::write(path, export_sweep_csv(&results)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Sweep results saved to: {}", path.display());
    }
    Ok(())
}

fn generate_cmd(count: usize, seed: u64, regime_length: usize, out: &Path) -> Result<()> {
    let candles = generate_candles(&SyntheticConfig {
        count,
        seed,
        regime_length,
        ..SyntheticConfig::default()
    });
    std::fs::write(out, export_candles_csv(&candles)?)
        .with_context(|| format!("failed to write {}", out.display()))?;
    println!("Wrote {} candles to {}", candles.len(), out.display());
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    let m = &result.metrics;
    println!();
    println!("=== Backtest Result ===");
    println!(
        "Run ID:         {}",
        result.run_id.get(..12).unwrap_or(&result.run_id)
    );
    println!(
        "Screening:      ADX({}) <= {}",
        result.screening.period, result.screening.max_lateral_threshold
    );
    println!("Mode:           {}", result.backtest.trading_mode);
    if let (Some(first), Some(last)) = (result.first_timestamp, result.last_timestamp) {
        println!(
            "Period:         {} to {}",
            format_timestamp(first),
            format_timestamp(last)
        );
    }
    println!("Candles:        {}", result.candle_count);
    println!(
        "Signals:        {} lateral, {} trending, {} absent",
        result.signals.lateral, result.signals.trending, result.signals.absent
    );
    println!("Trades:         {}", m.total_trades);
    println!();
    println!("--- Performance ---");
    println!("Initial:        {:.2}", m.initial_capital);
    println!("Final:          {:.2}", m.final_capital);
    println!("Total Return:   {:.2}%", m.total_return_pct);
    println!(
        "Win Rate:       {:.1}% ({} won, {} lost)",
        m.win_rate * 100.0,
        m.winning_trades,
        m.losing_trades
    );
    println!("Avg Win:        {:.2}", m.average_win);
    println!("Avg Loss:       {:.2}", m.average_loss);
    println!("Largest Win:    {:.2}", m.largest_win);
    println!("Largest Loss:   {:.2}", m.largest_loss);
    println!("Profit Factor:  {:.2}", m.profit_factor);
    println!(
        "Max Drawdown:   {:.2} ({:.2}%)",
        m.max_drawdown, m.max_drawdown_pct
    );
    println!("Sharpe:         {:.3}", m.sharpe_ratio);
    println!("Success Rate:   {:.2}%", m.screening_success_rate);
    println!("Avg Bars Held:  {:.1}", m.average_bars_held);
    println!("Max Consec Win: {}", m.max_consecutive_wins);
    println!("Max Consec Loss:{}", m.max_consecutive_losses);
}

fn print_ranking(results: &SweepResults, rank_by: FitnessMetric, top: usize) {
    println!();
    println!(
        "=== Sweep: {} runs ({} skipped), top {} by {} ===",
        results.len(),
        results.skipped(),
        top.min(results.len()),
        rank_by
    );
    println!(
        "{:>4}  {:>6}  {:>9}  {:>6}  {:>9}  {:>8}  {:>8}",
        "rank", "period", "threshold", "trades", "return%", "win%", "pf"
    );
    for (i, r) in results.top_n(rank_by, top).iter().enumerate() {
        let m = &r.metrics;
        println!(
            "{:>4}  {:>6}  {:>9.2}  {:>6}  {:>9.2}  {:>8.1}  {:>8.2}",
            i + 1,
            r.screening.period,
            r.screening.max_lateral_threshold,
            m.total_trades,
            m.total_return_pct,
            m.win_rate * 100.0,
            m.profit_factor
        );
    }
}
