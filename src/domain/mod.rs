//! Core domain types and logic.

pub mod allocation;
pub mod analysis;
pub mod backtest;
pub mod config_validation;
pub mod correlation;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod monte_carlo;
pub mod portfolio;
pub mod position;
pub mod series;
pub mod signal;
pub mod stats;
pub mod strategy;
pub mod synthetic;
