//! Synthetic scenario generator for stress tests.
//!
//! Produces random-walk probability paths tagged [`DataOrigin::Synthetic`].
//! Anything computed from these series is stress-test output, not measured
//! performance; the tag travels into every `StrategyResult`.

use chrono::{Duration, NaiveDateTime};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::error::ProbtraderError;
use super::series::{DataOrigin, MarketSeries, PricePoint};

const MIN_PRICE: f64 = 0.01;
const MAX_PRICE: f64 = 0.99;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticConfig {
    pub markets: usize,
    pub samples: usize,
    /// Maximum absolute step per sample, in probability points.
    pub volatility: f64,
    pub step_hours: i64,
    pub start: NaiveDateTime,
}

pub struct SyntheticScenario<R: Rng> {
    rng: R,
    config: SyntheticConfig,
}

impl SyntheticScenario<StdRng> {
    pub fn seeded(config: SyntheticConfig, seed: u64) -> Self {
        SyntheticScenario::new(StdRng::seed_from_u64(seed), config)
    }
}

impl<R: Rng> SyntheticScenario<R> {
    pub fn new(rng: R, config: SyntheticConfig) -> Self {
        SyntheticScenario { rng, config }
    }

    pub fn generate(&mut self) -> Result<Vec<MarketSeries>, ProbtraderError> {
        (0..self.config.markets)
            .map(|i| self.generate_market(i))
            .collect()
    }

    fn generate_market(&mut self, n: usize) -> Result<MarketSeries, ProbtraderError> {
        let id = format!("SYN-{:03}", n + 1);
        let label = format!("synthetic scenario {}", n + 1);
        // the end time is the furthest offset, so checking it covers every sample
        let end_time = self.offset(&id, self.config.samples)?;

        let vol = self.config.volatility.abs();
        let mut price: f64 = self.rng.gen_range(0.2..0.8);
        let mut points = Vec::with_capacity(self.config.samples);

        for i in 0..self.config.samples {
            points.push(PricePoint::new(self.offset(&id, i)?, price));
            // sum of two uniforms: triangular step centred on zero
            let shock = if vol > 0.0 {
                self.rng.gen_range(-vol..vol) / 2.0 + self.rng.gen_range(-vol..vol) / 2.0
            } else {
                0.0
            };
            price = (price + shock).clamp(MIN_PRICE, MAX_PRICE);
        }

        Ok(MarketSeries::new(id, label, end_time, points)?.with_origin(DataOrigin::Synthetic))
    }

    /// Timestamp of sample `index`: `start + index * step_hours`.
    fn offset(&self, market: &str, index: usize) -> Result<NaiveDateTime, ProbtraderError> {
        let step_hours = self.config.step_hours.max(1);
        i64::try_from(index)
            .ok()
            .and_then(|i| i.checked_mul(step_hours))
            .and_then(Duration::try_hours)
            .and_then(|d| self.config.start.checked_add_signed(d))
            .ok_or_else(|| ProbtraderError::InvalidSeries {
                market: market.to_string(),
                reason: format!(
                    "sample {index} at {step_hours}h steps is outside the supported date range"
                ),
            })
    }
}
