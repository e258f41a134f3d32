//! Configuration validation.
//!
//! Validates every config field before a run starts, so a bad value fails
//! fast with the offending section and key.

use crate::domain::error::ProbtraderError;
use crate::domain::strategy::StrategyKind;
use crate::ports::config_port::ConfigPort;
use std::str::FromStr;

/// Upper bound for hour-valued settings: 100 years.
const MAX_HOURS: i64 = 100 * 365 * 24;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    validate_initial_capital(config)?;
    validate_position_size(config)?;
    validate_max_positions(config)?;
    validate_fraction(config, "backtest", "fee_rate", 0.01)?;
    validate_fraction(config, "backtest", "cash_reserve", 0.1)?;
    validate_annualization(config)?;
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let runs = int_or(config, "analysis", "monte_carlo_runs", 1000)?;
    if runs < 1 {
        return Err(ProbtraderError::invalid_config(
            "analysis",
            "monte_carlo_runs",
            "monte_carlo_runs must be at least 1",
        ));
    }

    if let Some(seed) = config.get_string("analysis", "monte_carlo_seed") {
        if seed.trim().parse::<u64>().is_err() {
            return Err(ProbtraderError::invalid_config(
                "analysis",
                "monte_carlo_seed",
                "monte_carlo_seed must be a non-negative integer",
            ));
        }
    }

    let threshold = double_or(config, "analysis", "correlation_threshold", 0.3)?;
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(ProbtraderError::invalid_config(
            "analysis",
            "correlation_threshold",
            "correlation_threshold must be in (0, 1]",
        ));
    }
    Ok(())
}

/// Check the enabled list and every `[strategy.<name>]` override section.
pub fn validate_strategies_config(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    for section in config.sections() {
        if let Some(name) = section.strip_prefix("strategy.") {
            if name.parse::<StrategyKind>().is_err() {
                return Err(ProbtraderError::invalid_config(
                    &section,
                    "name",
                    format!("unknown strategy '{name}'"),
                ));
            }
        }
    }
    for kind in parse_enabled(config)? {
        validate_strategy_overrides(config, kind)?;
    }
    Ok(())
}

/// Enabled strategies in configured order, duplicates dropped. All
/// strategies when the key is absent.
pub fn parse_enabled(config: &dyn ConfigPort) -> Result<Vec<StrategyKind>, ProbtraderError> {
    let Some(names) = config.get_list("strategies", "enabled") else {
        return Ok(StrategyKind::ALL.to_vec());
    };

    let mut kinds = Vec::new();
    for name in &names {
        let kind: StrategyKind = name.parse()?;
        if !kinds.contains(&kind) {
            kinds.push(kind);
        }
    }

    if kinds.is_empty() {
        return Err(ProbtraderError::invalid_config(
            "strategies",
            "enabled",
            "at least one strategy must be enabled",
        ));
    }
    Ok(kinds)
}

pub fn strategy_section(kind: StrategyKind) -> String {
    format!("strategy.{}", kind.as_str())
}

fn validate_strategy_overrides(
    config: &dyn ConfigPort,
    kind: StrategyKind,
) -> Result<(), ProbtraderError> {
    let section = strategy_section(kind);
    let section = section.as_str();

    for key in ["lookback", "short_window", "long_window"] {
        if let Some(v) = parse_present::<i64>(config, section, key)? {
            if v < 1 {
                return Err(ProbtraderError::invalid_config(
                    section,
                    key,
                    format!("{key} must be at least 1"),
                ));
            }
        }
    }
    for key in ["window_hours", "max_hold_hours"] {
        if let Some(v) = parse_present::<i64>(config, section, key)? {
            if !(1..=MAX_HOURS).contains(&v) {
                return Err(ProbtraderError::invalid_config(
                    section,
                    key,
                    format!("{key} must be between 1 and {MAX_HOURS}"),
                ));
            }
        }
    }
    if let Some(v) = parse_present::<f64>(config, section, "threshold")? {
        if !(v > 0.0 && v <= 1.0) {
            return Err(ProbtraderError::invalid_config(
                section,
                "threshold",
                "threshold must be in (0, 1]",
            ));
        }
    }
    if let Some(v) = parse_present::<f64>(config, section, "stop_loss")? {
        if !(v > 0.0 && v < 1.0) {
            return Err(ProbtraderError::invalid_config(
                section,
                "stop_loss",
                "stop_loss must be in (0, 1)",
            ));
        }
    }
    if let Some(v) = parse_present::<f64>(config, section, "target")? {
        if !(0.0..1.0).contains(&v) {
            return Err(ProbtraderError::invalid_config(
                section,
                "target",
                "target must be in [0, 1)",
            ));
        }
    }
    Ok(())
}

/// The parsed value of `key`, `None` when absent, an error when present but
/// unparseable. The adapter's numeric getters fall back to a default
/// instead, so every numeric key is checked here first.
fn parse_present<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, ProbtraderError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    raw.trim().parse().map(Some).map_err(|_| {
        ProbtraderError::invalid_config(section, key, format!("'{}' is not a number", raw.trim()))
    })
}

fn double_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, ProbtraderError> {
    Ok(parse_present(config, section, key)?.unwrap_or(default))
}

fn int_or(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, ProbtraderError> {
    Ok(parse_present(config, section, key)?.unwrap_or(default))
}

fn validate_initial_capital(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = double_or(config, "backtest", "initial_capital", 10_000.0)?;
    if value.is_nan() || value <= 0.0 {
        return Err(ProbtraderError::invalid_config(
            "backtest",
            "initial_capital",
            "initial_capital must be positive",
        ));
    }
    Ok(())
}

fn validate_position_size(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = double_or(config, "backtest", "position_size", 0.1)?;
    if value.is_nan() || value <= 0.0 || value > 1.0 {
        return Err(ProbtraderError::invalid_config(
            "backtest",
            "position_size",
            "position_size must be in (0, 1]",
        ));
    }
    Ok(())
}

fn validate_max_positions(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = int_or(config, "backtest", "max_positions", 5)?;
    if value < 1 {
        return Err(ProbtraderError::invalid_config(
            "backtest",
            "max_positions",
            "max_positions must be at least 1",
        ));
    }
    Ok(())
}

/// Value must lie in [0, 1).
fn validate_fraction(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), ProbtraderError> {
    let value = double_or(config, section, key, default)?;
    if !(0.0..1.0).contains(&value) {
        return Err(ProbtraderError::invalid_config(
            section,
            key,
            format!("{key} must be in [0, 1)"),
        ));
    }
    Ok(())
}

fn validate_annualization(config: &dyn ConfigPort) -> Result<(), ProbtraderError> {
    let value = double_or(config, "backtest", "annualization_factor", 252.0)?;
    if value.is_nan() || value <= 0.0 {
        return Err(ProbtraderError::invalid_config(
            "backtest",
            "annualization_factor",
            "annualization_factor must be positive",
        ));
    }
    Ok(())
}
