//! Sharpe-weighted capital allocation across strategies.
//!
//! Blended figures are weight-dot-products of each strategy's own metrics.
//! That is a linear approximation: in particular the blended max drawdown is
//! not the drawdown of a combined equity curve.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::backtest::StrategyResult;
use super::metrics::Metrics;
use super::stats::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PortfolioAllocation {
    pub weights: BTreeMap<String, f64>,
    /// True when no strategy had a positive Sharpe and weights fell back to 1/N.
    pub equal_weighted: bool,
    pub blended_return: f64,
    pub blended_sharpe: f64,
    pub blended_max_drawdown: f64,
    /// (blended - average) / |average| of total return.
    pub return_benefit: f64,
    /// (blended - average) / |average| of Sharpe.
    pub sharpe_benefit: f64,
}

impl PortfolioAllocation {
    pub fn from_results(results: &[StrategyResult]) -> Self {
        let entries: Vec<(&str, &Metrics)> = results
            .iter()
            .map(|r| (r.strategy.as_str(), &r.metrics))
            .collect();
        allocate(&entries)
    }

    pub fn weight(&self, strategy: &str) -> Option<f64> {
        self.weights.get(strategy).copied()
    }
}

/// weight_i = max(0, sharpe_i) / sum_j max(0, sharpe_j), or 1/N when that
/// sum is zero or not finite.
pub fn sharpe_weights(sharpes: &[f64]) -> (Vec<f64>, bool) {
    if sharpes.is_empty() {
        return (Vec::new(), false);
    }
    let positive: Vec<f64> = sharpes
        .iter()
        .map(|&s| if s.is_finite() { s.max(0.0) } else { 0.0 })
        .collect();
    let total: f64 = positive.iter().sum();

    if total > 0.0 && total.is_finite() {
        (positive.iter().map(|p| p / total).collect(), false)
    } else {
        let equal = 1.0 / sharpes.len() as f64;
        (vec![equal; sharpes.len()], true)
    }
}

fn benefit(blended: f64, average: f64) -> f64 {
    if average == 0.0 {
        0.0
    } else {
        (blended - average) / average.abs()
    }
}

fn dot(weights: &[f64], values: &[f64]) -> f64 {
    weights.iter().zip(values).map(|(w, v)| w * v).sum()
}

pub fn allocate(entries: &[(&str, &Metrics)]) -> PortfolioAllocation {
    if entries.is_empty() {
        return PortfolioAllocation::default();
    }

    let returns: Vec<f64> = entries.iter().map(|(_, m)| m.total_return).collect();
    let sharpes: Vec<f64> = entries.iter().map(|(_, m)| m.sharpe_ratio).collect();
    let drawdowns: Vec<f64> = entries.iter().map(|(_, m)| m.max_drawdown).collect();

    let (weights, equal_weighted) = sharpe_weights(&sharpes);
    if equal_weighted {
        tracing::info!(
            strategies = entries.len(),
            "no strategy with positive Sharpe, allocating equally"
        );
    }

    let blended_return = dot(&weights, &returns);
    let blended_sharpe = dot(&weights, &sharpes);
    let blended_max_drawdown = dot(&weights, &drawdowns);

    PortfolioAllocation {
        weights: entries
            .iter()
            .zip(&weights)
            .map(|((name, _), &w)| (name.to_string(), w))
            .collect(),
        equal_weighted,
        blended_return,
        blended_sharpe,
        blended_max_drawdown,
        return_benefit: benefit(blended_return, mean(&returns)),
        sharpe_benefit: benefit(blended_sharpe, mean(&sharpes)),
    }
}
