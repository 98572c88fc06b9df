//! Seeded synthetic candles for testing and development.
//!
//! The series alternates between ranging regimes (mean-reverting noise around
//! an anchor price) and trending regimes (steady drift in a random direction),
//! so both screening outcomes show up in a single run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use regimelab_core::Candle;

/// Parameters for [`generate_candles`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub count: usize,
    pub seed: u64,
    pub start_price: f64,
    pub start_timestamp_ms: i64,
    pub interval_ms: i64,
    /// Per-candle noise as a fraction of price.
    pub volatility: f64,
    /// Per-candle drift during trending regimes, as a fraction of price.
    pub trend_strength: f64,
    /// Candles per regime before switching.
    pub regime_length: usize,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            count: 500,
            seed: 42,
            start_price: 100.0,
            // 2024-01-01T00:00:00Z
            start_timestamp_ms: 1_704_067_200_000,
            interval_ms: 3_600_000,
            volatility: 0.005,
            trend_strength: 0.008,
            regime_length: 60,
        }
    }
}

/// Generate `config.count` candles. Same config, same candles.
///
/// Output always passes `validate_candles`: finite, `high >= low` with open
/// and close inside the range, strictly increasing timestamps.
pub fn generate_candles(config: &SyntheticConfig) -> Vec<Candle> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let volatility = config.volatility.clamp(0.0, 0.2);
    let trend = config.trend_strength.clamp(0.0, 0.2);
    let regime_length = config.regime_length.max(1);
    let interval = config.interval_ms.max(1);

    let mut candles = Vec::with_capacity(config.count);
    let mut price = config.start_price.max(1.0);
    let mut anchor = price;
    let mut direction = 1.0;

    for i in 0..config.count {
        let regime = i / regime_length;
        let trending = regime % 2 == 1;
        if i % regime_length == 0 {
            anchor = price;
            direction = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
        }

        let noise = if volatility > 0.0 {
            rng.gen_range(-volatility..volatility)
        } else {
            0.0
        };
        let open = price;
        let raw_close = if trending {
            open * (1.0 + direction * trend + noise)
        } else {
            // Pull halfway back to the anchor each candle.
            (open + anchor) / 2.0 * (1.0 + noise)
        };
        let close = raw_close.max(0.01);

        let wick = |rng: &mut StdRng| {
            if volatility > 0.0 {
                rng.gen_range(0.0..volatility)
            } else {
                0.0
            }
        };
        let high = open.max(close) * (1.0 + wick(&mut rng));
        let low = open.min(close) * (1.0 - wick(&mut rng));

        candles.push(Candle::new(
            config.start_timestamp_ms + i as i64 * interval,
            open,
            high,
            low,
            close,
        ));
        price = close;
    }

    candles
}
