//! Monte Carlo resampling of trade outcomes.
//!
//! Each run bootstraps every strategy's trade returns (with replacement, as many
//! draws as there are trades), averages them per strategy, then averages across
//! strategies with equal weight. The sorted run outcomes form the reported
//! distribution.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::backtest::StrategyResult;
use super::stats::{mean, median_sorted, percentile_sorted};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub runs: usize,
    /// Sorted run outcomes (equal-weight mean trade return per run).
    pub samples: Vec<f64>,
    pub mean: f64,
    pub median: f64,
    pub p5: f64,
    pub p95: f64,
    pub worst: f64,
    pub best: f64,
}

impl MonteCarloSummary {
    fn from_samples(mut samples: Vec<f64>) -> Self {
        if samples.is_empty() {
            return MonteCarloSummary::default();
        }
        samples.sort_by(f64::total_cmp);
        MonteCarloSummary {
            runs: samples.len(),
            mean: mean(&samples),
            median: median_sorted(&samples),
            p5: percentile_sorted(&samples, 0.05),
            p95: percentile_sorted(&samples, 0.95),
            worst: samples[0],
            best: samples[samples.len() - 1],
            samples,
        }
    }
}

pub struct MonteCarlo<R: Rng> {
    rng: R,
}

impl MonteCarlo<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        MonteCarlo::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        MonteCarlo::new(StdRng::from_entropy())
    }
}

impl<R: Rng> MonteCarlo<R> {
    pub fn new(rng: R) -> Self {
        MonteCarlo { rng }
    }

    /// Resample the trade returns of each strategy `runs` times.
    pub fn run(&mut self, trade_returns: &[&[f64]], runs: usize) -> MonteCarloSummary {
        if runs == 0 || trade_returns.is_empty() {
            return MonteCarloSummary::default();
        }
        let samples = (0..runs)
            .map(|_| {
                let per_strategy: Vec<f64> = trade_returns
                    .iter()
                    .map(|returns| self.resample_mean(returns))
                    .collect();
                mean(&per_strategy)
            })
            .collect();
        MonteCarloSummary::from_samples(samples)
    }

    pub fn run_results(&mut self, results: &[StrategyResult], runs: usize) -> MonteCarloSummary {
        let returns: Vec<Vec<f64>> = results.iter().map(StrategyResult::trade_returns).collect();
        let slices: Vec<&[f64]> = returns.iter().map(Vec::as_slice).collect();
        self.run(&slices, runs)
    }

    /// Mean of `returns.len()` draws with replacement; 0 when there are no trades.
    fn resample_mean(&mut self, returns: &[f64]) -> f64 {
        if returns.is_empty() {
            return 0.0;
        }
        let n = returns.len();
        let total: f64 = (0..n).map(|_| returns[self.rng.gen_range(0..n)]).sum();
        total / n as f64
    }
}
