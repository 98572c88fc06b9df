//! CSV candle loading.
//!
//! Expected header: `timestamp,open,high,low,close`. Column order is free and
//! extra columns (volume, symbol, ...) are ignored.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use regimelab_core::{validate_candles, Candle, CandleError};

/// Errors from the data loading pipeline.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid candle data: {0}")]
    Invalid(#[from] CandleError),

    #[error("no candles in input")]
    Empty,
}

/// Options controlling how candles are loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Drop unparseable, insane or out-of-order rows (with a warning) instead
    /// of failing the whole load.
    pub skip_invalid: bool,
}

/// Load candles from a CSV file.
pub fn load_candles_csv(path: &Path, opts: &LoadOptions) -> Result<Vec<Candle>, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let candles = parse_candles_csv(file, opts)?;
    info!(path = %path.display(), candles = candles.len(), "loaded candles");
    Ok(candles)
}

/// Parse candles from any CSV reader, then validate the series.
pub fn parse_candles_csv<R: io::Read>(
    reader: R,
    opts: &LoadOptions,
) -> Result<Vec<Candle>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut candles: Vec<Candle> = Vec::new();

    for (row, record) in rdr.deserialize::<Candle>().enumerate() {
        let candle = match record {
            Ok(c) => c,
            Err(e) if opts.skip_invalid => {
                warn!(row, error = %e, "skipping unparseable row");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if opts.skip_invalid {
            if !candle.is_sane() {
                warn!(row, timestamp = candle.timestamp, "skipping malformed candle");
                continue;
            }
            if matches!(candles.last(), Some(prev) if candle.timestamp <= prev.timestamp) {
                warn!(row, timestamp = candle.timestamp, "skipping out-of-order candle");
                continue;
            }
        }
        candles.push(candle);
    }

    if candles.is_empty() {
        return Err(LoadError::Empty);
    }
    validate_candles(&candles)?;
    Ok(candles)
}
