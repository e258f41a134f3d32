//! Trade signals emitted by strategy evaluators.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ProbtraderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed entry with its risk bracket.
///
/// Long: `stop_loss < entry_price < target`. Short: `target < entry_price <
/// stop_loss`. `max_hold` is strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    direction: Direction,
    entry_price: f64,
    stop_loss: f64,
    target: f64,
    max_hold: Duration,
}

impl Signal {
    pub fn new(
        direction: Direction,
        entry_price: f64,
        stop_loss: f64,
        target: f64,
        max_hold: Duration,
    ) -> Result<Self, ProbtraderError> {
        let bracketed = match direction {
            Direction::Long => stop_loss < entry_price && entry_price < target,
            Direction::Short => target < entry_price && entry_price < stop_loss,
        };
        if !bracketed {
            return Err(ProbtraderError::InvalidSignal {
                reason: format!(
                    "{direction} entry {entry_price} not bracketed by stop {stop_loss} and target {target}"
                ),
            });
        }
        if max_hold <= Duration::zero() {
            return Err(ProbtraderError::InvalidSignal {
                reason: "max hold must be positive".to_string(),
            });
        }
        Ok(Signal {
            direction,
            entry_price,
            stop_loss,
            target,
            max_hold,
        })
    }

    /// Build a signal from distances away from the entry, clamping the
    /// bracket into the [0, 1] probability range.
    pub fn bracketed(
        direction: Direction,
        entry_price: f64,
        stop_distance: f64,
        target_distance: f64,
        max_hold: Duration,
    ) -> Result<Self, ProbtraderError> {
        let (stop_loss, target) = match direction {
            Direction::Long => (
                (entry_price - stop_distance).max(0.0),
                (entry_price + target_distance).min(1.0),
            ),
            Direction::Short => (
                (entry_price + stop_distance).min(1.0),
                (entry_price - target_distance).max(0.0),
            ),
        };
        Signal::new(direction, entry_price, stop_loss, target, max_hold)
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn entry_price(&self) -> f64 {
        self.entry_price
    }

    pub fn stop_loss(&self) -> f64 {
        self.stop_loss
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn max_hold(&self) -> Duration {
        self.max_hold
    }

    pub fn is_stop_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price <= self.stop_loss,
            Direction::Short => price >= self.stop_loss,
        }
    }

    pub fn is_target_hit(&self, price: f64) -> bool {
        match self.direction {
            Direction::Long => price >= self.target,
            Direction::Short => price <= self.target,
        }
    }
}
