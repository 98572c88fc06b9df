//! Parameter sweep over `(period, max_lateral_threshold)` pairs.
//!
//! Every grid point is an independent run. The only shared inputs are the
//! read-only candle slice and the base configuration, so points run in
//! parallel with no locking.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use regimelab_core::Candle;

use crate::config::RunConfig;
use crate::fitness::FitnessMetric;
use crate::runner::{run_backtest, BacktestResult};

/// Parameter grid specification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    /// ADX periods to test
    pub periods: Vec<usize>,

    /// Lateral thresholds to test
    pub thresholds: Vec<f64>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            periods: vec![7, 10, 14, 21, 28],
            thresholds: vec![10.0, 15.0, 20.0, 25.0],
        }
    }
}

impl ParamGrid {
    pub fn new(periods: Vec<usize>, thresholds: Vec<f64>) -> Self {
        Self {
            periods,
            thresholds,
        }
    }

    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.periods.len() * self.thresholds.len()
    }

    /// Generates all configurations in the grid, periods outermost.
    pub fn generate_configs(&self, base_config: &RunConfig) -> Vec<RunConfig> {
        let mut configs = Vec::with_capacity(self.size());
        for &period in &self.periods {
            for &threshold in &self.thresholds {
                configs.push(base_config.with_screening(period, threshold));
            }
        }
        configs
    }
}

/// Parameter sweep executor.
///
/// Runs backtests for all configurations in a grid, optionally in parallel.
#[derive(Debug, Clone, Copy)]
pub struct ParamSweep {
    parallel: bool,
}

impl Default for ParamSweep {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamSweep {
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every valid grid point over `candles`.
    ///
    /// Invalid points are skipped with a warning. Results keep grid order
    /// regardless of parallelism.
    pub fn sweep(&self, candles: &[Candle], grid: &ParamGrid, base_config: &RunConfig) -> SweepResults {
        let mut skipped = 0;
        let configs: Vec<RunConfig> = grid
            .generate_configs(base_config)
            .into_iter()
            .filter(|config| match config.validate() {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        period = config.screening.period,
                        threshold = config.screening.max_lateral_threshold,
                        error = %e,
                        "skipping invalid grid point"
                    );
                    skipped += 1;
                    false
                }
            })
            .collect();

        let results: Vec<BacktestResult> = if self.parallel {
            configs
                .par_iter()
                .map(|config| run_backtest(candles, config))
                .collect()
        } else {
            configs
                .iter()
                .map(|config| run_backtest(candles, config))
                .collect()
        };

        info!(
            runs = results.len(),
            skipped,
            parallel = self.parallel,
            "sweep complete"
        );

        SweepResults { results, skipped }
    }
}

/// Results from a parameter sweep, in grid order.
#[derive(Debug, Clone)]
pub struct SweepResults {
    results: Vec<BacktestResult>,
    skipped: usize,
}

impl SweepResults {
    /// Returns all results as a slice.
    pub fn all(&self) -> &[BacktestResult] {
        &self.results
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if there are no results.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of grid points rejected by validation.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Gets a result by RunId.
    pub fn get(&self, run_id: &str) -> Option<&BacktestResult> {
        self.results.iter().find(|r| r.run_id == run_id)
    }

    /// Results sorted best-first by `metric`. Ties keep grid order.
    pub fn ranked_by(&self, metric: FitnessMetric) -> Vec<&BacktestResult> {
        let mut sorted: Vec<_> = self.results.iter().collect();
        sorted.sort_by(|a, b| {
            let (va, vb) = (metric.extract(&a.metrics), metric.extract(&b.metrics));
            if metric.is_better(va, vb) {
                Ordering::Less
            } else if metric.is_better(vb, va) {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        });
        sorted
    }

    /// Returns the top N results by `metric`.
    pub fn top_n(&self, metric: FitnessMetric, n: usize) -> Vec<&BacktestResult> {
        self.ranked_by(metric).into_iter().take(n).collect()
    }

    pub fn best(&self, metric: FitnessMetric) -> Option<&BacktestResult> {
        self.ranked_by(metric).into_iter().next()
    }
}
