//! Fitness function — configurable metric selector for ranking sweep results.

use serde::{Deserialize, Serialize};

use crate::metrics::PerformanceMetrics;

/// Which metric to rank by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessMetric {
    #[default]
    TotalReturn,
    ProfitFactor,
    Sharpe,
    WinRate,
    MaxDrawdown,
}

impl FitnessMetric {
    /// Extract the relevant metric value from a PerformanceMetrics struct.
    pub fn extract(&self, metrics: &PerformanceMetrics) -> f64 {
        match self {
            Self::TotalReturn => metrics.total_return_pct,
            Self::ProfitFactor => metrics.profit_factor,
            Self::Sharpe => metrics.sharpe_ratio,
            Self::WinRate => metrics.win_rate,
            Self::MaxDrawdown => metrics.max_drawdown,
        }
    }

    /// Whether higher values are better for this metric.
    ///
    /// Drawdown is a positive magnitude, so lower is better.
    pub fn is_higher_better(&self) -> bool {
        !matches!(self, Self::MaxDrawdown)
    }

    /// Returns true if `a` is strictly better than `b`.
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        if self.is_higher_better() {
            a > b
        } else {
            a < b
        }
    }
}

impl std::fmt::Display for FitnessMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::TotalReturn => "total_return",
            Self::ProfitFactor => "profit_factor",
            Self::Sharpe => "sharpe",
            Self::WinRate => "win_rate",
            Self::MaxDrawdown => "max_drawdown",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for FitnessMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "total_return" | "return" => Ok(Self::TotalReturn),
            "profit_factor" => Ok(Self::ProfitFactor),
            "sharpe" => Ok(Self::Sharpe),
            "win_rate" => Ok(Self::WinRate),
            "max_drawdown" | "drawdown" => Ok(Self::MaxDrawdown),
            other => Err(format!(
                "unknown metric '{other}' (expected total_return, profit_factor, sharpe, win_rate or max_drawdown)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metrics() -> PerformanceMetrics {
        PerformanceMetrics::compute(&[], 11_500.0, 300.0, 40, 10_000.0)
    }

    #[test]
    fn extract_reads_matching_field() {
        let m = sample_metrics();
        assert!((FitnessMetric::TotalReturn.extract(&m) - 15.0).abs() < 1e-12);
        assert_eq!(FitnessMetric::MaxDrawdown.extract(&m), 300.0);
        assert_eq!(FitnessMetric::WinRate.extract(&m), 0.0);
    }

    #[test]
    fn drawdown_prefers_lower() {
        assert!(FitnessMetric::MaxDrawdown.is_better(100.0, 250.0));
        assert!(!FitnessMetric::MaxDrawdown.is_better(250.0, 100.0));
        assert!(FitnessMetric::Sharpe.is_better(1.2, 0.8));
    }

    #[test]
    fn parse_and_display_roundtrip() {
        for metric in [
            FitnessMetric::TotalReturn,
            FitnessMetric::ProfitFactor,
            FitnessMetric::Sharpe,
            FitnessMetric::WinRate,
            FitnessMetric::MaxDrawdown,
        ] {
            assert_eq!(metric.to_string().parse::<FitnessMetric>(), Ok(metric));
        }
        assert_eq!("profit-factor".parse::<FitnessMetric>(), Ok(FitnessMetric::ProfitFactor));
        assert!("sortino".parse::<FitnessMetric>().is_err());
    }
}
