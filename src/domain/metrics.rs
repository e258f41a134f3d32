//! Performance metrics and statistics.
//!
//! Every formula has a defined fallback for empty or degenerate input
//! (no trades, flat equity, no losses) and never panics.

use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;
use super::position::{ClosedTrade, ExitReason};
use super::stats::{mean, std_dev};

/// Deviations at or below this are treated as zero.
const MIN_DEVIATION: f64 = 1e-12;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExitReasonCounts {
    pub stop_loss: usize,
    pub target: usize,
    pub time_limit: usize,
    pub market_close: usize,
}

impl ExitReasonCounts {
    pub fn count(trades: &[ClosedTrade]) -> Self {
        let mut counts = ExitReasonCounts::default();
        for trade in trades {
            match trade.exit_reason {
                ExitReason::StopLoss => counts.stop_loss += 1,
                ExitReason::Target => counts.target += 1,
                ExitReason::TimeLimit => counts.time_limit += 1,
                ExitReason::MarketClose => counts.market_close += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: f64,
    #[serde(with = "ratio_serde")]
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub avg_holding_hours: f64,
    pub total_fees: f64,
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown: f64,
    pub exit_reasons: ExitReasonCounts,
}

impl Metrics {
    pub fn compute(
        trades: &[ClosedTrade],
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        annualization_factor: f64,
    ) -> Self {
        let returns = period_returns(equity_curve);
        let total_return = total_return(equity_curve, initial_capital);
        let max_drawdown = max_drawdown(equity_curve);

        let mut winners = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_hours = 0.0_f64;
        let mut total_fees = 0.0_f64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                winners += 1;
                total_wins += pnl;
                largest_win = largest_win.max(pnl);
            } else {
                total_losses += pnl.abs();
                largest_loss = largest_loss.max(pnl.abs());
            }
            total_hours += trade.holding_hours();
            total_fees += trade.fees;
        }

        let total_trades = trades.len();
        let losers = total_trades - winners;

        let avg_win = if winners > 0 {
            total_wins / winners as f64
        } else {
            0.0
        };
        let avg_loss = if losers > 0 {
            total_losses / losers as f64
        } else {
            0.0
        };
        let avg_holding_hours = if total_trades > 0 {
            total_hours / total_trades as f64
        } else {
            0.0
        };

        Metrics {
            total_trades,
            winners,
            losers,
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            total_pnl: total_wins - total_losses,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            avg_holding_hours,
            total_fees,
            total_return,
            sharpe_ratio: sharpe_ratio(&returns, annualization_factor),
            sortino_ratio: sortino_ratio(&returns, annualization_factor),
            calmar_ratio: calmar_ratio(total_return, max_drawdown),
            max_drawdown,
            exit_reasons: ExitReasonCounts::count(trades),
        }
    }
}

/// winners / total, 0 without trades.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().filter(|t| t.is_win()).count() as f64 / trades.len() as f64
}

/// Gross profit over gross loss. Infinite with profits and no losses, 0 when
/// both are 0.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    let wins: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let losses: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if losses > 0.0 {
        wins / losses
    } else if wins > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// r_i = equity_i / equity_{i-1} - 1; a non-positive previous equity yields 0.
pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|w| {
            let prev = w[0].equity;
            if prev > 0.0 {
                w[1].equity / prev - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// final equity / initial capital - 1; 0 on an empty curve.
pub fn total_return(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    match equity_curve.last() {
        Some(last) if initial_capital > 0.0 => last.equity / initial_capital - 1.0,
        _ => 0.0,
    }
}

/// mean / σ × √factor, 0 when σ is 0.
pub fn sharpe_ratio(returns: &[f64], annualization_factor: f64) -> f64 {
    let sigma = std_dev(returns);
    if sigma <= MIN_DEVIATION {
        return 0.0;
    }
    mean(returns) / sigma * annualization_factor.max(0.0).sqrt()
}

/// mean / downside deviation × √factor, where the downside deviation only
/// looks at negative returns. 0 when there are none.
pub fn sortino_ratio(returns: &[f64], annualization_factor: f64) -> f64 {
    let negatives: Vec<f64> = returns.iter().copied().filter(|&r| r < 0.0).collect();
    if negatives.is_empty() {
        return 0.0;
    }
    let downside = (negatives.iter().map(|r| r * r).sum::<f64>() / negatives.len() as f64).sqrt();
    if downside <= MIN_DEVIATION {
        return 0.0;
    }
    mean(returns) / downside * annualization_factor.max(0.0).sqrt()
}

/// Largest peak-to-trough decline as a fraction of the running peak.
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    let Some(first) = equity_curve.first() else {
        return 0.0;
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.equity) / peak);
        }
    }
    max_dd
}

/// total return / max drawdown, 0 without a drawdown.
pub fn calmar_ratio(total_return: f64, max_drawdown: f64) -> f64 {
    if max_drawdown > 0.0 {
        total_return / max_drawdown
    } else {
        0.0
    }
}

/// Serializes non-finite ratios as strings so JSON round-trips keep them.
pub(crate) mod ratio_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("nan")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(v) => Ok(v),
            Repr::Text(text) => match text.as_str() {
                "inf" => Ok(f64::INFINITY),
                "-inf" => Ok(f64::NEG_INFINITY),
                "nan" => Ok(f64::NAN),
                other => Err(serde::de::Error::custom(format!("invalid ratio '{other}'"))),
            },
        }
    }
}
