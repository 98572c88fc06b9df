//! Run configuration file (TOML).
//!
//! ```toml
//! [screening]
//! period = 14
//! max_lateral_threshold = 15.0
//!
//! [backtest]
//! initial_capital = 10000.0
//! trading_mode = "long"
//! max_holding_period = 20
//!
//! [sweep]
//! periods = [7, 14, 21]
//! thresholds = [10.0, 15.0, 20.0]
//! ```
//!
//! Every field is optional and falls back to the core defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use regimelab_core::{BacktestConfig, ConfigError, ScreeningConfig};

use crate::sweep::ParamGrid;

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors reading a run configuration file.
#[derive(Debug, Error)]
pub enum FileConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(#[from] ConfigError),
}

/// Everything needed to reproduce one run, plus an optional sweep grid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub screening: ScreeningConfig,
    pub backtest: BacktestConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sweep: Option<ParamGrid>,
}

impl RunConfig {
    /// Load and validate a run configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, FileConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| FileConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a run configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, FileConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, FileConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate screening and backtest sections. The sweep grid is validated
    /// point by point when the sweep runs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.screening.validate()?;
        self.backtest.validate()
    }

    /// Same run with different screening parameters and no sweep section.
    pub fn with_screening(&self, period: usize, max_lateral_threshold: f64) -> Self {
        Self {
            screening: ScreeningConfig {
                period,
                max_lateral_threshold,
                ..self.screening
            },
            backtest: self.backtest,
            sweep: None,
        }
    }

    /// Deterministic hash of the screening and backtest parameters.
    ///
    /// The sweep section does not participate: each grid point gets its own ID.
    pub fn run_id(&self) -> RunId {
        let mut hasher = blake3::Hasher::new();

        let s = &self.screening;
        hasher.update(&(s.period as u64).to_le_bytes());
        hasher.update(&s.max_lateral_threshold.to_bits().to_le_bytes());
        hasher.update(&[u8::from(s.discard_zero_adx)]);

        let b = &self.backtest;
        for value in [
            b.initial_capital,
            b.position_size,
            b.commission_rate,
            b.slippage_rate,
        ] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
        let holding = b.max_holding_period.map_or(u64::MAX, |h| h as u64);
        hasher.update(&holding.to_le_bytes());
        hasher.update(b.trading_mode.to_string().as_bytes());

        hasher.finalize().to_hex().to_string()
    }
}
