//! Volatility-spike reversion: when recent return volatility jumps well
//! above its baseline, fade the latest move.

use super::{Heuristic, MarketContext, RiskParams};
use crate::domain::series::PriceHistory;
use crate::domain::signal::{Direction, Signal};
use crate::domain::stats::std_dev;

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilitySpikeParams {
    /// Returns in the recent window.
    pub short_window: usize,
    /// Returns in the baseline window preceding the recent one.
    pub long_window: usize,
    pub multiplier: f64,
    pub risk: RiskParams,
}

impl Default for VolatilitySpikeParams {
    fn default() -> Self {
        VolatilitySpikeParams {
            short_window: 3,
            long_window: 20,
            multiplier: 2.5,
            risk: RiskParams {
                stop_loss: 0.06,
                target: 0.06,
                max_hold_hours: 48,
            },
        }
    }
}

impl Heuristic for VolatilitySpikeParams {
    fn lookback(&self) -> usize {
        self.short_window + self.long_window
    }

    fn signal(&self, history: &PriceHistory<'_>, _ctx: &MarketContext<'_>) -> Option<Signal> {
        let returns = history.trailing_returns(self.lookback());
        if returns.len() < self.lookback() {
            return None;
        }
        let (baseline, recent) = returns.split_at(self.long_window);

        let baseline_vol = std_dev(baseline);
        if baseline_vol <= 1e-9 {
            return None;
        }
        if std_dev(recent) < self.multiplier * baseline_vol {
            return None;
        }

        let last_move = *recent.last()?;
        let price = history.current().price;
        if last_move > 0.0 {
            self.risk.signal(Direction::Short, price)
        } else if last_move < 0.0 {
            self.risk.signal(Direction::Long, price)
        } else {
            None
        }
    }
}
