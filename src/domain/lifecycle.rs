//! Position lifecycle: entry sizing, exit rules and settlement.
//!
//! A position is OPEN from the moment capital is reserved until one of the
//! exit rules fires on a later sample of its market, or the market runs out
//! of samples. Closing moves it out of the portfolio into a [`ClosedTrade`];
//! there is no way back.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::portfolio::Portfolio;
use super::position::{ClosedTrade, ExitReason, Position};
use super::series::PricePoint;
use super::signal::{Direction, Signal};

/// Sizing and exposure limits for one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Fraction of current cash committed per trade.
    pub position_size: f64,
    /// Cap on concurrently open positions.
    pub max_positions: usize,
    /// Fee fraction charged on entry capital and on gross exit value.
    pub fee_rate: f64,
    /// Fraction of initial capital that must stay in cash.
    pub cash_reserve: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        LifecycleConfig {
            position_size: 0.1,
            max_positions: 5,
            fee_rate: 0.01,
            cash_reserve: 0.1,
        }
    }
}

/// fee = value * fee_rate
pub fn calculate_fee(value: f64, fee_rate: f64) -> f64 {
    value * fee_rate
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AlreadyOpen,
    MaxPositions,
    CashReserve,
    NoCapital,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryResult {
    Entered { capital: f64, fee: f64, shares: f64 },
    Skipped(SkipReason),
}

/// Owns every open position of a single strategy run.
#[derive(Debug, Clone)]
pub struct PositionManager {
    strategy: String,
    config: LifecycleConfig,
    portfolio: Portfolio,
    last_prices: HashMap<String, f64>,
}

impl PositionManager {
    pub fn new(strategy: &str, initial_capital: f64, config: LifecycleConfig) -> Self {
        PositionManager {
            strategy: strategy.to_string(),
            config,
            portfolio: Portfolio::new(initial_capital),
            last_prices: HashMap::new(),
        }
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn into_portfolio(self) -> Portfolio {
        self.portfolio
    }

    pub fn open_count(&self) -> usize {
        self.portfolio.position_count()
    }

    /// Reserve capital for `signal`.
    ///
    /// 1. At most one open position per market
    /// 2. Respect the open-position cap
    /// 3. capital = cash * position_size
    /// 4. Refuse if cash after reserving would drop below the reserve floor
    /// 5. Deduct capital from cash and open the position
    pub fn try_open(&mut self, market_id: &str, signal: Signal, time: NaiveDateTime) -> EntryResult {
        if self.portfolio.has_position(market_id) {
            return EntryResult::Skipped(SkipReason::AlreadyOpen);
        }
        if self.portfolio.position_count() >= self.config.max_positions {
            return EntryResult::Skipped(SkipReason::MaxPositions);
        }

        let capital = self.portfolio.cash * self.config.position_size;
        if capital <= 0.0 {
            return EntryResult::Skipped(SkipReason::NoCapital);
        }

        let floor = self.portfolio.initial_capital * self.config.cash_reserve;
        if self.portfolio.cash - capital < floor {
            tracing::debug!(
                strategy = %self.strategy,
                market = market_id,
                cash = self.portfolio.cash,
                floor,
                "signal ignored: cash reserve"
            );
            return EntryResult::Skipped(SkipReason::CashReserve);
        }

        let position = Position::open(market_id, signal, time, capital, self.config.fee_rate);
        let result = EntryResult::Entered {
            capital,
            fee: position.entry_fee,
            shares: position.shares,
        };

        self.portfolio.cash -= capital;
        self.last_prices
            .insert(market_id.to_string(), position.entry_price());
        self.portfolio.add_position(position);

        result
    }

    /// Feed a new sample of `market_id`: refresh its mark price and close its
    /// position if an exit rule fires.
    pub fn on_sample(&mut self, market_id: &str, point: &PricePoint) -> Option<ClosedTrade> {
        self.last_prices.insert(market_id.to_string(), point.price);

        let reason = self
            .portfolio
            .get_position(market_id)?
            .exit_reason(point.timestamp, point.price)?;

        self.close(market_id, point.timestamp, point.price, reason)
    }

    /// Settle whatever is still open in `market_id` at its final sample.
    pub fn force_close(&mut self, market_id: &str, point: &PricePoint) -> Option<ClosedTrade> {
        self.last_prices.insert(market_id.to_string(), point.price);
        self.close(market_id, point.timestamp, point.price, ExitReason::MarketClose)
    }

    /// Close the position in `market_id` at `exit_price`.
    ///
    /// 1. Gross exit value (shorts: escrowed notional plus price move)
    /// 2. Exit fee on the gross value
    /// 3. PnL = net exit value - capital used
    /// 4. Credit net value to cash and record the trade
    pub fn close(
        &mut self,
        market_id: &str,
        exit_time: NaiveDateTime,
        exit_price: f64,
        reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let position = self.portfolio.remove_position(market_id)?;

        let gross = position.market_value(exit_price);
        let exit_fee = calculate_fee(gross, self.config.fee_rate);
        let net = gross - exit_fee;
        let pnl = net - position.capital;
        let pnl_pct = if position.capital > 0.0 {
            pnl / position.capital
        } else {
            0.0
        };

        self.portfolio.cash += net;

        let trade = ClosedTrade {
            strategy: self.strategy.clone(),
            market_id: position.market_id.clone(),
            direction: position.direction(),
            entry_time: position.entry_time,
            exit_time,
            entry_price: position.entry_price(),
            exit_price,
            stop_loss: position.signal.stop_loss(),
            target: position.signal.target(),
            shares: position.shares,
            capital: position.capital,
            pnl,
            pnl_pct,
            fees: position.entry_fee + exit_fee,
            exit_reason: reason,
        };

        tracing::debug!(
            strategy = %self.strategy,
            market = market_id,
            direction = %trade.direction,
            reason = %reason,
            pnl,
            "position closed"
        );

        self.portfolio.record_trade(trade.clone());
        Some(trade)
    }

    /// Append an equity sample: cash plus open positions at their last price.
    pub fn mark_equity(&mut self, time: NaiveDateTime) -> f64 {
        let equity = self.portfolio.total_equity(&self.last_prices);
        self.portfolio.record_equity(time, equity);
        equity
    }
}

/// Direction-adjusted distance of `price` past `level`: positive when the
/// price is beyond the level on the losing side for `direction`.
pub fn beyond_stop(direction: Direction, price: f64, level: f64) -> f64 {
    match direction {
        Direction::Long => level - price,
        Direction::Short => price - level,
    }
}
