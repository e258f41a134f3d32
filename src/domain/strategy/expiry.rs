//! Time-to-expiry filter: close to market end, back a decisive favourite.

use chrono::Duration;

use super::{Heuristic, MarketContext, RiskParams};
use crate::domain::series::PriceHistory;
use crate::domain::signal::{Direction, Signal};

#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryParams {
    /// Only trade when at most this many hours remain.
    pub window_hours: i64,
    /// Long at or above this price.
    pub favourite: f64,
    /// Short at or below this price.
    pub longshot: f64,
    pub risk: RiskParams,
}

impl Default for ExpiryParams {
    fn default() -> Self {
        ExpiryParams {
            window_hours: 168,
            favourite: 0.80,
            longshot: 0.20,
            risk: RiskParams {
                stop_loss: 0.10,
                target: 0.15,
                max_hold_hours: 168,
            },
        }
    }
}

impl Heuristic for ExpiryParams {
    fn lookback(&self) -> usize {
        1
    }

    fn signal(&self, history: &PriceHistory<'_>, ctx: &MarketContext<'_>) -> Option<Signal> {
        let current = history.current();
        let remaining = ctx.end_time - current.timestamp;
        let window = Duration::try_hours(self.window_hours)?;
        if remaining <= Duration::zero() || remaining > window {
            return None;
        }

        let direction = if current.price >= self.favourite {
            Direction::Long
        } else if current.price <= self.longshot {
            Direction::Short
        } else {
            return None;
        };

        // never hold past market end
        let hold_hours = self.risk.max_hold_hours.min(remaining.num_hours().max(1));
        let risk = RiskParams {
            max_hold_hours: hold_hours,
            ..self.risk
        };
        risk.signal(direction, current.price)
    }
}
