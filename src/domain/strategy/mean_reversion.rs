//! Mean-reversion band: trade back towards the rolling mean when the price
//! leaves a `mean ± k·σ` band.

use super::{Heuristic, MarketContext, RiskParams};
use crate::domain::series::PriceHistory;
use crate::domain::signal::{Direction, Signal};
use crate::domain::stats::{mean, std_dev};

#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionParams {
    pub lookback: usize,
    pub band_width: f64,
    /// Bands narrower than this are treated as a flat market.
    pub min_std: f64,
    /// `risk.target` is unused; the target is the rolling mean.
    pub risk: RiskParams,
}

impl Default for MeanReversionParams {
    fn default() -> Self {
        MeanReversionParams {
            lookback: 20,
            band_width: 2.0,
            min_std: 0.005,
            risk: RiskParams {
                stop_loss: 0.05,
                target: 0.0,
                max_hold_hours: 120,
            },
        }
    }
}

impl Heuristic for MeanReversionParams {
    fn lookback(&self) -> usize {
        self.lookback
    }

    fn signal(&self, history: &PriceHistory<'_>, _ctx: &MarketContext<'_>) -> Option<Signal> {
        let window: Vec<f64> = history
            .preceding(self.lookback)
            .iter()
            .map(|p| p.price)
            .collect();
        let sigma = std_dev(&window);
        if sigma < self.min_std {
            return None;
        }
        let centre = mean(&window);
        let price = history.current().price;

        let direction = if price < centre - self.band_width * sigma {
            Direction::Long
        } else if price > centre + self.band_width * sigma {
            Direction::Short
        } else {
            return None;
        };

        let reversion = RiskParams {
            target: (centre - price).abs(),
            ..self.risk
        };
        reversion.signal(direction, price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::test_support::daily_series;

    fn oscillating(n: usize) -> Vec<f64> {
        (0..n).map(|i| if i % 2 == 0 { 0.48 } else { 0.52 }).collect()
    }

    fn eval(prices: &[f64]) -> Option<Signal> {
        let series = daily_series(prices, 90);
        let ctx = MarketContext::from_series(&series);
        let history = series.history(prices.len() - 2).unwrap();
        MeanReversionParams::default().signal(&history, &ctx)
    }

    #[test]
    fn drop_below_band_goes_long_to_mean() {
        let mut prices = oscillating(20);
        prices.extend([0.40, 0.40]);
        let signal = eval(&prices).unwrap();
        assert_eq!(signal.direction(), Direction::Long);
        assert!((signal.target() - 0.50).abs() < 1e-9);
    }

    #[test]
    fn spike_above_band_goes_short() {
        let mut prices = oscillating(20);
        prices.extend([0.60, 0.60]);
        let signal = eval(&prices).unwrap();
        assert_eq!(signal.direction(), Direction::Short);
        assert!((signal.target() - 0.50).abs() < 1e-9);
    }

    #[test]
    fn inside_band_is_ignored() {
        let mut prices = oscillating(20);
        prices.extend([0.51, 0.51]);
        assert!(eval(&prices).is_none());
    }
}
