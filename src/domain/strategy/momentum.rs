//! Breakout momentum: follow a move beyond the prior window's range.

use super::{Heuristic, MarketContext, RiskParams};
use crate::domain::series::PriceHistory;
use crate::domain::signal::{Direction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumParams {
    pub lookback: usize,
    /// Distance past the prior high/low required to count as a breakout.
    pub threshold: f64,
    pub risk: RiskParams,
}

impl Default for MomentumParams {
    fn default() -> Self {
        MomentumParams {
            lookback: 10,
            threshold: 0.05,
            risk: RiskParams {
                stop_loss: 0.05,
                target: 0.10,
                max_hold_hours: 168,
            },
        }
    }
}

impl Heuristic for MomentumParams {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn signal(&self, history: &PriceHistory<'_>, _ctx: &MarketContext<'_>) -> Option<Signal> {
        let prior = history.preceding(self.lookback);
        if prior.is_empty() {
            return None;
        }
        let high = prior.iter().map(|p| p.price).fold(f64::MIN, f64::max);
        let low = prior.iter().map(|p| p.price).fold(f64::MAX, f64::min);
        let price = history.current().price;

        if price > high + self.threshold {
            self.risk.signal(Direction::Long, price)
        } else if price < low - self.threshold {
            self.risk.signal(Direction::Short, price)
        } else {
            None
        }
    }
}
