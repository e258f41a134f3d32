#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use probtrader::domain::backtest::BacktestConfig;
use probtrader::domain::error::ProbtraderError;
use probtrader::domain::lifecycle::LifecycleConfig;
use probtrader::domain::series::{MarketInfo, MarketSeries, PricePoint};
use probtrader::domain::strategy::{MomentumParams, RiskParams, Strategy};
use probtrader::ports::data_port::DataPort;
use std::collections::HashMap;
use std::process::ExitCode;

pub struct MockDataPort {
    pub markets: Vec<MarketInfo>,
    pub prices: HashMap<String, Vec<f64>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            markets: Vec::new(),
            prices: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_market(mut self, id: &str, prices: &[f64]) -> Self {
        self.markets.push(MarketInfo {
            id: id.to_string(),
            label: format!("{id} resolves yes"),
            end_time: start() + Duration::days(prices.len() as i64 + 30),
        });
        self.prices.insert(id.to_string(), prices.to_vec());
        self
    }

    pub fn with_error(mut self, id: &str, reason: &str) -> Self {
        self.markets.push(MarketInfo {
            id: id.to_string(),
            label: id.to_string(),
            end_time: start() + Duration::days(365),
        });
        self.errors.insert(id.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn list_markets(&self) -> Result<Vec<MarketInfo>, ProbtraderError> {
        Ok(self.markets.clone())
    }

    fn fetch_series(&self, market: &MarketInfo) -> Result<MarketSeries, ProbtraderError> {
        if let Some(reason) = self.errors.get(&market.id) {
            return Err(ProbtraderError::DataSource {
                reason: reason.clone(),
            });
        }
        let prices = self.prices.get(&market.id).cloned().unwrap_or_default();
        MarketSeries::new(&market.id, &market.label, market.end_time, daily_points(&prices))
    }
}

pub fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn at_hours(hours: i64) -> NaiveDateTime {
    start() + Duration::hours(hours)
}

pub fn daily_points(prices: &[f64]) -> Vec<PricePoint> {
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(start() + Duration::days(i as i64), p))
        .collect()
}

/// Daily series starting at [`start`], ending 30 days after its last sample.
pub fn make_series(id: &str, prices: &[f64]) -> MarketSeries {
    MarketSeries::new(
        id,
        id,
        start() + Duration::days(prices.len() as i64 + 30),
        daily_points(prices),
    )
    .unwrap()
}

/// Rises from 0.3 with a breakout at index 4, then reaches 0.7.
pub fn breakout_prices() -> Vec<f64> {
    vec![0.3, 0.3, 0.3, 0.3, 0.4, 0.45, 0.5, 0.7, 0.7, 0.7]
}

pub fn quick_momentum() -> Strategy {
    Strategy::Momentum(MomentumParams {
        lookback: 3,
        threshold: 0.05,
        risk: RiskParams {
            stop_loss: 0.1,
            target: 0.2,
            max_hold_hours: 24 * 30,
        },
    })
}

pub fn sample_config() -> BacktestConfig {
    BacktestConfig {
        initial_capital: 1_000.0,
        lifecycle: LifecycleConfig {
            position_size: 0.5,
            max_positions: 5,
            fee_rate: 0.01,
            cash_reserve: 0.0,
        },
        annualization_factor: 252.0,
    }
}

pub fn is_success(code: ExitCode) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::SUCCESS)
}

pub fn exit_code_is(code: ExitCode, expected: u8) -> bool {
    format!("{code:?}") == format!("{:?}", ExitCode::from(expected))
}
