//! Backtest engine and event loop.
//!
//! One strategy walks the unified timeline of all markets in timestamp
//! order. At each timestamp, every market with a sample there is processed:
//! exits for its open position, then (unless it is the market's final sample)
//! a fresh evaluation. Equity is marked once per timestamp. Independent
//! strategies share nothing mutable and run in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::lifecycle::{EntryResult, LifecycleConfig, PositionManager};
use super::metrics::{Metrics, period_returns};
use super::portfolio::EquityPoint;
use super::position::ClosedTrade;
use super::series::{DataOrigin, MarketSeries, build_unified_timeline};
use super::strategy::{MarketContext, Strategy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub initial_capital: f64,
    pub lifecycle: LifecycleConfig,
    pub annualization_factor: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_capital: 10_000.0,
            lifecycle: LifecycleConfig::default(),
            annualization_factor: 252.0,
        }
    }
}

/// Everything one strategy produced in one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: String,
    pub origin: DataOrigin,
    pub initial_capital: f64,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub period_returns: Vec<f64>,
    pub metrics: Metrics,
}

impl StrategyResult {
    pub fn trade_returns(&self) -> Vec<f64> {
        self.trades.iter().map(|t| t.pnl_pct).collect()
    }
}

pub fn run_strategy(
    strategy: &Strategy,
    series: &[MarketSeries],
    config: &BacktestConfig,
) -> StrategyResult {
    let timeline = build_unified_timeline(series);
    let contexts: Vec<MarketContext<'_>> = series.iter().map(MarketContext::from_series).collect();
    let mut manager = PositionManager::new(
        strategy.name(),
        config.initial_capital,
        config.lifecycle.clone(),
    );
    let mut signals = 0usize;

    for &timestamp in &timeline {
        for (market, ctx) in series.iter().zip(&contexts) {
            let Some(index) = market.index_of(timestamp) else {
                continue;
            };
            let point = &market.points()[index];

            manager.on_sample(&market.id, point);

            if Some(index) == market.last_index() {
                manager.force_close(&market.id, point);
                continue;
            }

            if let Some(signal) = strategy.evaluate(market, index, ctx) {
                signals += 1;
                if let EntryResult::Skipped(reason) = manager.try_open(&market.id, signal, timestamp)
                {
                    tracing::trace!(strategy = strategy.name(), market = %market.id, ?reason, "signal skipped");
                }
            }
        }
        manager.mark_equity(timestamp);
    }

    let portfolio = manager.into_portfolio();
    let origin = if series.iter().any(|s| s.origin == DataOrigin::Synthetic) {
        DataOrigin::Synthetic
    } else {
        DataOrigin::Historical
    };

    let metrics = Metrics::compute(
        &portfolio.closed_trades,
        &portfolio.equity_curve,
        config.initial_capital,
        config.annualization_factor,
    );

    tracing::info!(
        strategy = strategy.name(),
        signals,
        trades = portfolio.closed_trades.len(),
        total_return = metrics.total_return,
        "strategy run complete"
    );

    StrategyResult {
        strategy: strategy.name().to_string(),
        origin,
        initial_capital: config.initial_capital,
        period_returns: period_returns(&portfolio.equity_curve),
        trades: portfolio.closed_trades,
        equity_curve: portfolio.equity_curve,
        metrics,
    }
}

/// Run every strategy over the same markets, in parallel. Results keep the
/// order of `strategies`.
pub fn run_all(
    strategies: &[Strategy],
    series: &[MarketSeries],
    config: &BacktestConfig,
) -> Vec<StrategyResult> {
    strategies
        .par_iter()
        .map(|strategy| run_strategy(strategy, series, config))
        .collect()
}
