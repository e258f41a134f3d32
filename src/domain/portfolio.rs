//! Per-strategy cash, open positions and equity tracking.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub cash: f64,
    pub initial_capital: f64,
    pub positions: HashMap<String, Position>,
    pub closed_trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            cash: initial_capital,
            initial_capital,
            positions: HashMap::new(),
            closed_trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    pub fn add_position(&mut self, position: Position) {
        self.positions.insert(position.market_id.clone(), position);
    }

    pub fn get_position(&self, market_id: &str) -> Option<&Position> {
        self.positions.get(market_id)
    }

    pub fn has_position(&self, market_id: &str) -> bool {
        self.positions.contains_key(market_id)
    }

    pub fn remove_position(&mut self, market_id: &str) -> Option<Position> {
        self.positions.remove(market_id)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.closed_trades.push(trade);
    }

    pub fn record_equity(&mut self, timestamp: NaiveDateTime, equity: f64) {
        self.equity_curve.push(EquityPoint { timestamp, equity });
    }

    /// Cash plus open positions marked at the latest known price of their
    /// market. Positions without a known price are carried at cost.
    pub fn total_equity(&self, last_prices: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| match last_prices.get(&pos.market_id) {
                Some(&price) => pos.market_value(price),
                None => pos.capital,
            })
            .sum();
        self.cash + position_value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{Direction, Signal};
    use chrono::{Duration, NaiveDate};

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_position(market: &str, capital: f64) -> Position {
        let signal = Signal::new(Direction::Long, 0.5, 0.4, 0.7, Duration::days(3)).unwrap();
        Position::open(market, signal, t0(), capital, 0.0)
    }

    #[test]
    fn new_portfolio() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.cash - 10_000.0).abs() < f64::EPSILON);
        assert!((portfolio.initial_capital - 10_000.0).abs() < f64::EPSILON);
        assert!(portfolio.positions.is_empty());
        assert!(portfolio.closed_trades.is_empty());
        assert!(portfolio.equity_curve.is_empty());
    }

    #[test]
    fn add_get_remove_position() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.add_position(sample_position("RAIN", 100.0));
        assert!(portfolio.has_position("RAIN"));
        assert_eq!(portfolio.position_count(), 1);
        assert!(portfolio.get_position("RAIN").is_some());

        assert!(portfolio.remove_position("RAIN").is_some());
        assert!(!portfolio.has_position("RAIN"));
        assert!(portfolio.remove_position("RAIN").is_none());
    }

    #[test]
    fn record_equity() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.record_equity(t0(), 10_500.0);
        assert_eq!(portfolio.equity_curve.len(), 1);
        assert_eq!(portfolio.equity_curve[0].timestamp, t0());
    }

    #[test]
    fn total_equity_no_positions() {
        let portfolio = Portfolio::new(10_000.0);
        assert!((portfolio.total_equity(&HashMap::new()) - 10_000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_equity_marks_positions() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.add_position(sample_position("RAIN", 1_000.0));
        portfolio.cash = 9_000.0;

        let mut prices = HashMap::new();
        prices.insert("RAIN".to_string(), 0.6);
        // 2000 shares at 0.6
        assert!((portfolio.total_equity(&prices) - 10_200.0).abs() < 1e-9);
    }

    #[test]
    fn total_equity_unknown_price_uses_cost() {
        let mut portfolio = Portfolio::new(10_000.0);
        portfolio.add_position(sample_position("RAIN", 1_000.0));
        portfolio.cash = 9_000.0;
        assert!((portfolio.total_equity(&HashMap::new()) - 10_000.0).abs() < 1e-9);
    }
}
