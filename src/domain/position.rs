//! Open positions and closed-trade settlement records.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::{Direction, Signal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitReason {
    StopLoss,
    Target,
    TimeLimit,
    MarketClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop-loss",
            ExitReason::Target => "target",
            ExitReason::TimeLimit => "time-limit",
            ExitReason::MarketClose => "market-close",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An open trade. Owned by exactly one strategy's portfolio.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub market_id: String,
    pub signal: Signal,
    pub entry_time: NaiveDateTime,
    pub capital: f64,
    pub entry_fee: f64,
    pub shares: f64,
}

impl Position {
    /// Reserve `capital` for `signal`; the entry fee is taken out of the
    /// capital before shares are bought.
    pub fn open(
        market_id: &str,
        signal: Signal,
        entry_time: NaiveDateTime,
        capital: f64,
        fee_rate: f64,
    ) -> Self {
        let entry_fee = capital * fee_rate;
        let shares = (capital - entry_fee) / signal.entry_price();
        Position {
            market_id: market_id.to_string(),
            signal,
            entry_time,
            capital,
            entry_fee,
            shares,
        }
    }

    pub fn direction(&self) -> Direction {
        self.signal.direction()
    }

    pub fn entry_price(&self) -> f64 {
        self.signal.entry_price()
    }

    /// Value of the position if it were settled at `price`, before fees.
    /// Shorts return the escrowed notional plus the price move in their
    /// favour, floored at zero.
    pub fn market_value(&self, price: f64) -> f64 {
        match self.direction() {
            Direction::Long => self.shares * price,
            Direction::Short => (self.shares * (2.0 * self.entry_price() - price)).max(0.0),
        }
    }

    /// Exit rule for the sample at `time`/`price`. Stop-loss wins over
    /// target, target over time limit.
    pub fn exit_reason(&self, time: NaiveDateTime, price: f64) -> Option<ExitReason> {
        if self.signal.is_stop_hit(price) {
            Some(ExitReason::StopLoss)
        } else if self.signal.is_target_hit(price) {
            Some(ExitReason::Target)
        } else if time - self.entry_time >= self.signal.max_hold() {
            Some(ExitReason::TimeLimit)
        } else {
            None
        }
    }
}

/// Immutable settlement record of a closed position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub strategy: String,
    pub market_id: String,
    pub direction: Direction,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub entry_price: f64,
    pub exit_price: f64,
    pub stop_loss: f64,
    pub target: f64,
    pub shares: f64,
    pub capital: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub fees: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn holding_period(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn holding_hours(&self) -> f64 {
        self.holding_period().num_seconds() as f64 / 3600.0
    }
}
