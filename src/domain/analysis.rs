//! Cross-strategy analysis and the run report.
//!
//! Runs after every strategy has finished: correlation of period returns,
//! Sharpe-weighted allocation and Monte Carlo resampling of trade returns.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::allocation::PortfolioAllocation;
use super::backtest::{BacktestConfig, StrategyResult};
use super::correlation::{CorrelationMatrix, CorrelationPair};
use super::monte_carlo::{MonteCarlo, MonteCarloSummary};
use super::series::DataOrigin;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub monte_carlo_runs: usize,
    /// Fixed seed for reproducible resampling; entropy when absent.
    pub monte_carlo_seed: Option<u64>,
    pub correlation_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            monte_carlo_runs: 1000,
            monte_carlo_seed: None,
            correlation_threshold: 0.3,
        }
    }
}

/// Everything one invocation produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub origin: DataOrigin,
    pub backtest: BacktestConfig,
    pub analysis: AnalysisConfig,
    pub markets: usize,
    pub results: Vec<StrategyResult>,
    pub correlation: CorrelationMatrix,
    pub low_correlation_pairs: Vec<CorrelationPair>,
    pub allocation: PortfolioAllocation,
    pub monte_carlo: MonteCarloSummary,
}

impl RunReport {
    pub fn is_synthetic(&self) -> bool {
        self.origin == DataOrigin::Synthetic
    }
}

/// Build the report using the resampler described by `analysis`.
pub fn analyze(
    results: Vec<StrategyResult>,
    markets: usize,
    backtest: &BacktestConfig,
    analysis: &AnalysisConfig,
) -> RunReport {
    match analysis.monte_carlo_seed {
        Some(seed) => analyze_with(results, markets, backtest, analysis, MonteCarlo::seeded(seed)),
        None => analyze_with(results, markets, backtest, analysis, MonteCarlo::from_entropy()),
    }
}

pub fn analyze_with<R: Rng>(
    results: Vec<StrategyResult>,
    markets: usize,
    backtest: &BacktestConfig,
    analysis: &AnalysisConfig,
    mut monte_carlo: MonteCarlo<R>,
) -> RunReport {
    let correlation = CorrelationMatrix::from_results(&results);
    let low_correlation_pairs = correlation.low_correlation_pairs(analysis.correlation_threshold);
    let allocation = PortfolioAllocation::from_results(&results);
    let monte_carlo = monte_carlo.run_results(&results, analysis.monte_carlo_runs);

    let origin = if results.iter().any(|r| r.origin == DataOrigin::Synthetic) {
        DataOrigin::Synthetic
    } else {
        DataOrigin::Historical
    };

    tracing::info!(
        strategies = results.len(),
        low_correlation_pairs = low_correlation_pairs.len(),
        monte_carlo_runs = monte_carlo.runs,
        "analysis complete"
    );

    RunReport {
        origin,
        backtest: backtest.clone(),
        analysis: analysis.clone(),
        markets,
        results,
        correlation,
        low_correlation_pairs,
        allocation,
        monte_carlo,
    }
}
