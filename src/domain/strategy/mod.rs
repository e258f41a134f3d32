//! Strategy registry and the evaluator contract.
//!
//! Every heuristic implements [`Heuristic`] against a [`PriceHistory`], a
//! prefix view that ends at the sample being evaluated. The closed
//! [`Strategy`] enum is the only way the backtest reaches a heuristic.

pub mod expiry;
pub mod fade;
pub mod mean_reversion;
pub mod momentum;
pub mod volatility_spike;

use chrono::{Duration, NaiveDateTime};
use std::fmt;
use std::str::FromStr;

use super::error::ProbtraderError;
use super::series::{MarketSeries, PriceHistory};
use super::signal::{Direction, Signal};

pub use expiry::ExpiryParams;
pub use fade::FadeParams;
pub use mean_reversion::MeanReversionParams;
pub use momentum::MomentumParams;
pub use volatility_spike::VolatilitySpikeParams;

/// Market metadata an evaluator may use besides prices.
#[derive(Debug, Clone, Copy)]
pub struct MarketContext<'a> {
    pub market_id: &'a str,
    pub end_time: NaiveDateTime,
}

impl<'a> MarketContext<'a> {
    pub fn from_series(series: &'a MarketSeries) -> Self {
        MarketContext {
            market_id: &series.id,
            end_time: series.end_time,
        }
    }
}

/// Stop/target distances (in probability points) and maximum hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskParams {
    pub stop_loss: f64,
    pub target: f64,
    pub max_hold_hours: i64,
}

impl RiskParams {
    /// `None` when the hour count does not fit a `Duration`.
    pub fn max_hold(&self) -> Option<Duration> {
        Duration::try_hours(self.max_hold_hours)
    }

    /// Signal at `entry` with this bracket, or `None` when the bracket
    /// collapses against the edge of the probability range.
    pub fn signal(&self, direction: Direction, entry: f64) -> Option<Signal> {
        let max_hold = self.max_hold()?;
        Signal::bracketed(direction, entry, self.stop_loss, self.target, max_hold).ok()
    }
}

pub trait Heuristic {
    /// Samples required before the current one.
    fn lookback(&self) -> usize;

    fn signal(&self, history: &PriceHistory<'_>, ctx: &MarketContext<'_>) -> Option<Signal>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    Momentum,
    Fade,
    MeanReversion,
    Expiry,
    VolatilitySpike,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::Momentum,
        StrategyKind::Fade,
        StrategyKind::MeanReversion,
        StrategyKind::Expiry,
        StrategyKind::VolatilitySpike,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Momentum => "momentum",
            StrategyKind::Fade => "fade",
            StrategyKind::MeanReversion => "mean_reversion",
            StrategyKind::Expiry => "expiry",
            StrategyKind::VolatilitySpike => "volatility_spike",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ProbtraderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.as_str() == name)
            .ok_or_else(|| {
                ProbtraderError::invalid_config(
                    "strategies",
                    "enabled",
                    format!("unknown strategy '{}'", s.trim()),
                )
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Strategy {
    Momentum(MomentumParams),
    Fade(FadeParams),
    MeanReversion(MeanReversionParams),
    Expiry(ExpiryParams),
    VolatilitySpike(VolatilitySpikeParams),
}

impl Strategy {
    pub fn with_defaults(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::Momentum => Strategy::Momentum(MomentumParams::default()),
            StrategyKind::Fade => Strategy::Fade(FadeParams::default()),
            StrategyKind::MeanReversion => Strategy::MeanReversion(MeanReversionParams::default()),
            StrategyKind::Expiry => Strategy::Expiry(ExpiryParams::default()),
            StrategyKind::VolatilitySpike => {
                Strategy::VolatilitySpike(VolatilitySpikeParams::default())
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Momentum(_) => StrategyKind::Momentum,
            Strategy::Fade(_) => StrategyKind::Fade,
            Strategy::MeanReversion(_) => StrategyKind::MeanReversion,
            Strategy::Expiry(_) => StrategyKind::Expiry,
            Strategy::VolatilitySpike(_) => StrategyKind::VolatilitySpike,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn heuristic(&self) -> &dyn Heuristic {
        match self {
            Strategy::Momentum(p) => p,
            Strategy::Fade(p) => p,
            Strategy::MeanReversion(p) => p,
            Strategy::Expiry(p) => p,
            Strategy::VolatilitySpike(p) => p,
        }
    }

    pub fn lookback(&self) -> usize {
        self.heuristic().lookback()
    }

    /// Evaluate the sample at `index` of `series` using only samples up to
    /// and including it. An out-of-range index is a caller bug.
    pub fn evaluate(
        &self,
        series: &MarketSeries,
        index: usize,
        ctx: &MarketContext<'_>,
    ) -> Option<Signal> {
        debug_assert!(
            index < series.len(),
            "evaluator index {index} out of bounds for {} ({} samples)",
            series.id,
            series.len()
        );
        let Some(history) = series.history(index) else {
            tracing::warn!(
                strategy = self.name(),
                market = %series.id,
                index,
                "evaluation index out of bounds, signal skipped"
            );
            return None;
        };
        self.evaluate_history(&history, ctx)
    }

    /// No signal before the lookback is filled or on the final sample.
    pub fn evaluate_history(
        &self,
        history: &PriceHistory<'_>,
        ctx: &MarketContext<'_>,
    ) -> Option<Signal> {
        if history.index() < self.lookback() || history.is_final() {
            return None;
        }
        self.heuristic().signal(history, ctx)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::daily_series;
    use super::*;

    #[test]
    fn unrepresentable_max_hold_gives_no_signal() {
        let risk = RiskParams {
            stop_loss: 0.1,
            target: 0.2,
            max_hold_hours: 10_000_000_000_000,
        };
        assert_eq!(risk.max_hold(), None);
        assert!(risk.signal(Direction::Long, 0.5).is_none());

        let series = daily_series(&[0.3, 0.3, 0.3, 0.3, 0.4, 0.45], 60);
        let ctx = MarketContext::from_series(&series);
        let strategy = Strategy::Momentum(MomentumParams {
            lookback: 3,
            threshold: 0.05,
            risk,
        });
        assert!(strategy.evaluate(&series, 4, &ctx).is_none());
    }

    #[test]
    fn kind_round_trips_through_names() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            assert_eq!(Strategy::with_defaults(kind).kind(), kind);
        }
        assert_eq!(
            " Mean_Reversion ".parse::<StrategyKind>().unwrap(),
            StrategyKind::MeanReversion
        );
        assert!("martingale".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn flat_series_never_signals() {
        let series = daily_series(&[0.5; 30], 29);
        let ctx = MarketContext::from_series(&series);
        for kind in StrategyKind::ALL {
            let strategy = Strategy::with_defaults(kind);
            for i in 0..series.len() {
                assert!(
                    strategy.evaluate(&series, i, &ctx).is_none(),
                    "{kind} signalled on flat series at {i}"
                );
            }
        }
    }

    #[test]
    fn no_signal_on_final_index() {
        // a jump on the last sample would trigger momentum anywhere else
        let mut prices = vec![0.3; 15];
        prices.push(0.6);
        let series = daily_series(&prices, 40);
        let ctx = MarketContext::from_series(&series);
        let strategy = Strategy::with_defaults(StrategyKind::Momentum);
        assert!(strategy.evaluate(&series, series.len() - 1, &ctx).is_none());

        prices.push(0.6);
        let series = daily_series(&prices, 40);
        let ctx = MarketContext::from_series(&series);
        assert!(strategy.evaluate(&series, 15, &ctx).is_some());
    }

    #[test]
    fn no_signal_before_lookback() {
        let series = daily_series(&[0.3, 0.3, 0.9, 0.9], 40);
        let ctx = MarketContext::from_series(&series);
        let strategy = Strategy::with_defaults(StrategyKind::Momentum);
        assert!(strategy.lookback() > 2);
        assert!(strategy.evaluate(&series, 2, &ctx).is_none());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "out of bounds")]
    fn out_of_bounds_index_fails_loudly_in_debug() {
        let series = daily_series(&[0.5; 5], 10);
        let ctx = MarketContext::from_series(&series);
        let strategy = Strategy::with_defaults(StrategyKind::Fade);
        strategy.evaluate(&series, 99, &ctx);
    }

    #[test]
    fn risk_params_reject_degenerate_bracket() {
        let risk = RiskParams {
            stop_loss: 0.05,
            target: 0.1,
            max_hold_hours: 24,
        };
        assert!(risk.signal(Direction::Long, 1.0).is_none());
        assert!(risk.signal(Direction::Short, 0.0).is_none());
        assert!(risk.signal(Direction::Long, 0.5).is_some());
    }
}
