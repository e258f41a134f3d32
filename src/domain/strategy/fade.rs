//! Contrarian fade: bet against a sharp move over a short window.

use super::{Heuristic, MarketContext, RiskParams};
use crate::domain::series::PriceHistory;
use crate::domain::signal::{Direction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct FadeParams {
    pub lookback: usize,
    /// Minimum absolute change over the window to fade.
    pub threshold: f64,
    pub risk: RiskParams,
}

impl Default for FadeParams {
    fn default() -> Self {
        FadeParams {
            lookback: 3,
            threshold: 0.10,
            risk: RiskParams {
                stop_loss: 0.08,
                target: 0.08,
                max_hold_hours: 72,
            },
        }
    }
}

impl Heuristic for FadeParams {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn signal(&self, history: &PriceHistory<'_>, _ctx: &MarketContext<'_>) -> Option<Signal> {
        let anchor = history.preceding(self.lookback).first()?.price;
        let price = history.current().price;
        let change = price - anchor;

        if change >= self.threshold {
            self.risk.signal(Direction::Short, price)
        } else if change <= -self.threshold {
            self.risk.signal(Direction::Long, price)
        } else {
            None
        }
    }
}
