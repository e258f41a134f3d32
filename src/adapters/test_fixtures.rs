//! Shared report fixture for adapter tests.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::analysis::{AnalysisConfig, RunReport, analyze};
use crate::domain::backtest::{BacktestConfig, run_all};
use crate::domain::series::{MarketSeries, PricePoint};
use crate::domain::strategy::{MomentumParams, RiskParams, Strategy, StrategyKind};

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

fn market(id: &str, prices: &[f64]) -> MarketSeries {
    let points = prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(start() + Duration::days(i as i64), p))
        .collect();
    MarketSeries::new(id, id, start() + Duration::days(60), points).unwrap()
}

/// Two breakout markets traded by a short-lookback momentum strategy plus
/// the default fade strategy.
pub(crate) fn sample_report() -> RunReport {
    let markets = vec![
        market("UP", &[0.3, 0.3, 0.3, 0.3, 0.4, 0.45, 0.5, 0.7, 0.7, 0.7]),
        market("DOWN", &[0.6, 0.6, 0.6, 0.6, 0.5, 0.48, 0.55, 0.35, 0.3, 0.3]),
    ];
    let strategies = vec![
        Strategy::Momentum(MomentumParams {
            lookback: 3,
            threshold: 0.05,
            risk: RiskParams {
                stop_loss: 0.1,
                target: 0.2,
                max_hold_hours: 24 * 30,
            },
        }),
        Strategy::with_defaults(StrategyKind::Fade),
    ];
    let backtest = BacktestConfig::default();
    let analysis = AnalysisConfig {
        monte_carlo_runs: 25,
        monte_carlo_seed: Some(7),
        correlation_threshold: 0.3,
    };
    let results = run_all(&strategies, &markets, &backtest);
    analyze(results, markets.len(), &backtest, &analysis)
}
