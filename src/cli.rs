//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_trade_log_adapter::CsvTradeLogAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use crate::domain::analysis::{AnalysisConfig, RunReport, analyze};
use crate::domain::backtest::{BacktestConfig, run_all};
use crate::domain::config_validation::{
    parse_enabled, strategy_section, validate_analysis_config, validate_backtest_config,
    validate_strategies_config,
};
use crate::domain::error::ProbtraderError;
use crate::domain::lifecycle::LifecycleConfig;
use crate::domain::series::MarketSeries;
use crate::domain::strategy::{RiskParams, Strategy, StrategyKind};
use crate::domain::synthetic::{SyntheticConfig, SyntheticScenario};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "probtrader", about = "Probability-price strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay historical market data through every enabled strategy
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory holding markets.csv and one <id>.csv per market
        #[arg(short, long)]
        data: PathBuf,
        /// JSON snapshot of the full run
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,
        /// Optional CSV log of every closed trade
        #[arg(short, long)]
        trades: Option<PathBuf>,
    },
    /// Run the strategies over synthetic random-walk markets
    Stress {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long, default_value_t = 10)]
        markets: usize,
        #[arg(long, default_value_t = 500)]
        samples: usize,
        /// Maximum step per sample, in probability points
        #[arg(long, default_value_t = 0.03)]
        volatility: f64,
        #[arg(long, default_value_t = 24)]
        step_hours: i64,
        #[arg(long, default_value = "2024-01-01", value_parser = parse_date)]
        start: NaiveDate,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(short, long, default_value = "stress.json")]
        output: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("invalid date '{value}' (expected YYYY-MM-DD)"))
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            data,
            output,
            trades,
        } => run_replay(&config, &data, &output, trades.as_ref()),
        Command::Stress {
            config,
            markets,
            samples,
            volatility,
            step_hours,
            start,
            seed,
            output,
        } => {
            let synthetic = SyntheticConfig {
                markets,
                samples,
                volatility,
                step_hours,
                start: start.and_time(NaiveTime::MIN),
            };
            run_stress(&config, synthetic, seed, &output)
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = ProbtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Everything a run needs from the config file, validated.
pub struct RunSettings {
    pub backtest: BacktestConfig,
    pub analysis: AnalysisConfig,
    pub strategies: Vec<Strategy>,
}

pub fn load_settings(config: &dyn ConfigPort) -> Result<RunSettings, ProbtraderError> {
    validate_backtest_config(config)?;
    validate_analysis_config(config)?;
    validate_strategies_config(config)?;
    Ok(RunSettings {
        backtest: build_backtest_config(config),
        analysis: build_analysis_config(config),
        strategies: build_strategies(config)?,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> BacktestConfig {
    let defaults = BacktestConfig::default();
    let lifecycle = LifecycleConfig::default();
    BacktestConfig {
        initial_capital: config.get_double("backtest", "initial_capital", defaults.initial_capital),
        lifecycle: LifecycleConfig {
            position_size: config.get_double("backtest", "position_size", lifecycle.position_size),
            max_positions: config
                .get_int("backtest", "max_positions", lifecycle.max_positions as i64)
                .max(1) as usize,
            fee_rate: config.get_double("backtest", "fee_rate", lifecycle.fee_rate),
            cash_reserve: config.get_double("backtest", "cash_reserve", lifecycle.cash_reserve),
        },
        annualization_factor: config.get_double(
            "backtest",
            "annualization_factor",
            defaults.annualization_factor,
        ),
    }
}

pub fn build_analysis_config(config: &dyn ConfigPort) -> AnalysisConfig {
    let defaults = AnalysisConfig::default();
    AnalysisConfig {
        monte_carlo_runs: config
            .get_int("analysis", "monte_carlo_runs", defaults.monte_carlo_runs as i64)
            .max(0) as usize,
        monte_carlo_seed: config
            .get_string("analysis", "monte_carlo_seed")
            .and_then(|s| s.trim().parse().ok()),
        correlation_threshold: config.get_double(
            "analysis",
            "correlation_threshold",
            defaults.correlation_threshold,
        ),
    }
}

pub fn build_strategies(config: &dyn ConfigPort) -> Result<Vec<Strategy>, ProbtraderError> {
    Ok(parse_enabled(config)?
        .into_iter()
        .map(|kind| build_strategy(kind, config))
        .collect())
}

fn get_usize(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    config.get_int(section, key, default as i64).max(1) as usize
}

fn apply_risk_overrides(config: &dyn ConfigPort, section: &str, risk: &mut RiskParams) {
    risk.stop_loss = config.get_double(section, "stop_loss", risk.stop_loss);
    risk.target = config.get_double(section, "target", risk.target);
    risk.max_hold_hours = config.get_int(section, "max_hold_hours", risk.max_hold_hours);
}

/// Defaults for `kind`, overridden by its `[strategy.<name>]` section.
pub fn build_strategy(kind: StrategyKind, config: &dyn ConfigPort) -> Strategy {
    let section = strategy_section(kind);
    let section = section.as_str();
    let mut strategy = Strategy::with_defaults(kind);

    match &mut strategy {
        Strategy::Momentum(p) => {
            p.lookback = get_usize(config, section, "lookback", p.lookback);
            p.threshold = config.get_double(section, "threshold", p.threshold);
            apply_risk_overrides(config, section, &mut p.risk);
        }
        Strategy::Fade(p) => {
            p.lookback = get_usize(config, section, "lookback", p.lookback);
            p.threshold = config.get_double(section, "threshold", p.threshold);
            apply_risk_overrides(config, section, &mut p.risk);
        }
        Strategy::MeanReversion(p) => {
            p.lookback = get_usize(config, section, "lookback", p.lookback);
            p.band_width = config.get_double(section, "band_width", p.band_width);
            p.min_std = config.get_double(section, "min_std", p.min_std);
            apply_risk_overrides(config, section, &mut p.risk);
        }
        Strategy::Expiry(p) => {
            p.window_hours = config.get_int(section, "window_hours", p.window_hours);
            p.favourite = config.get_double(section, "favourite", p.favourite);
            p.longshot = config.get_double(section, "longshot", p.longshot);
            apply_risk_overrides(config, section, &mut p.risk);
        }
        Strategy::VolatilitySpike(p) => {
            p.short_window = get_usize(config, section, "short_window", p.short_window);
            p.long_window = get_usize(config, section, "long_window", p.long_window);
            p.multiplier = config.get_double(section, "multiplier", p.multiplier);
            apply_risk_overrides(config, section, &mut p.risk);
        }
    }
    strategy
}

/// Load every market the port lists. Markets that fail to load or validate
/// are skipped with a warning.
pub fn load_markets(data_port: &dyn DataPort) -> Result<Vec<MarketSeries>, ProbtraderError> {
    let markets = data_port.list_markets()?;
    let mut series = Vec::with_capacity(markets.len());

    for market in &markets {
        match data_port.fetch_series(market) {
            Ok(s) if s.is_empty() => {
                tracing::warn!(market = %market.id, "skipping market with no samples");
            }
            Ok(s) => series.push(s),
            Err(e) => {
                tracing::warn!(market = %market.id, error = %e, "skipping market");
            }
        }
    }

    if series.is_empty() {
        return Err(ProbtraderError::NoData);
    }
    Ok(series)
}

/// Backtest every strategy over `series`, then analyse the results.
pub fn run_pipeline(series: &[MarketSeries], settings: &RunSettings) -> RunReport {
    let names: Vec<&str> = settings.strategies.iter().map(Strategy::name).collect();
    eprintln!(
        "Running {} strategies over {} markets: {}",
        settings.strategies.len(),
        series.len(),
        names.join(", ")
    );

    let results = run_all(&settings.strategies, series, &settings.backtest);
    analyze(results, series.len(), &settings.backtest, &settings.analysis)
}

fn run_replay(
    config_path: &PathBuf,
    data_path: &PathBuf,
    output_path: &PathBuf,
    trades_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 2: Load market data
    eprintln!("Loading markets from {}", data_path.display());
    let data_port = CsvAdapter::new(data_path.clone());
    let series = match load_markets(&data_port) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Backtest and analyse
    let report = run_pipeline(&series, &settings);
    print_summary(&report);

    // Stage 4: Write reports
    write_reports(&report, output_path, trades_path)
}

fn run_stress(
    config_path: &PathBuf,
    synthetic: SyntheticConfig,
    seed: u64,
    output_path: &PathBuf,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!(
        "Generating {} synthetic markets x {} samples (seed {})",
        synthetic.markets, synthetic.samples, seed
    );
    let series = match SyntheticScenario::seeded(synthetic, seed).generate() {
        Ok(s) if !s.is_empty() => s,
        Ok(_) => {
            let e = ProbtraderError::NoData;
            eprintln!("error: {e}");
            return (&e).into();
        }
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = run_pipeline(&series, &settings);
    print_summary(&report);
    write_reports(&report, output_path, None)
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    let settings = match load_settings(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let bt = &settings.backtest;
    eprintln!("\nBacktest:");
    eprintln!("  initial capital:   {:.2}", bt.initial_capital);
    eprintln!("  position size:     {:.1}%", bt.lifecycle.position_size * 100.0);
    eprintln!("  max positions:     {}", bt.lifecycle.max_positions);
    eprintln!("  fee rate:          {:.2}%", bt.lifecycle.fee_rate * 100.0);
    eprintln!("  cash reserve:      {:.1}%", bt.lifecycle.cash_reserve * 100.0);
    eprintln!("  annualization:     {}", bt.annualization_factor);

    let an = &settings.analysis;
    eprintln!("\nAnalysis:");
    eprintln!("  monte carlo runs:  {}", an.monte_carlo_runs);
    match an.monte_carlo_seed {
        Some(seed) => eprintln!("  monte carlo seed:  {seed}"),
        None => eprintln!("  monte carlo seed:  (entropy)"),
    }
    eprintln!("  corr. threshold:   {}", an.correlation_threshold);

    eprintln!("\nStrategies:");
    for strategy in &settings.strategies {
        eprintln!("  {} (lookback {})", strategy.name(), strategy.lookback());
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn write_reports(
    report: &RunReport,
    output_path: &PathBuf,
    trades_path: Option<&PathBuf>,
) -> ExitCode {
    let output = output_path.display().to_string();
    if let Err(e) = JsonSnapshotAdapter::new().write(report, &output) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("\nReport written to: {output}");

    if let Some(path) = trades_path {
        let path = path.display().to_string();
        if let Err(e) = CsvTradeLogAdapter::new().write(report, &path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Trade log written to: {path}");
    }
    ExitCode::SUCCESS
}

pub fn print_summary(report: &RunReport) {
    if report.is_synthetic() {
        eprintln!("\n*** SYNTHETIC DATA: stress-test output, not validated performance ***");
    }

    eprintln!("\n=== Strategy Results ===");
    eprintln!(
        "  {:<18} {:>6} {:>7} {:>9} {:>7} {:>7} {:>7}",
        "strategy", "trades", "win%", "return%", "sharpe", "sortino", "maxdd%"
    );
    for result in &report.results {
        let m = &result.metrics;
        eprintln!(
            "  {:<18} {:>6} {:>7.1} {:>9.2} {:>7.2} {:>7.2} {:>7.1}",
            result.strategy,
            m.total_trades,
            m.win_rate * 100.0,
            m.total_return * 100.0,
            m.sharpe_ratio,
            m.sortino_ratio,
            m.max_drawdown * 100.0,
        );
    }

    if !report.low_correlation_pairs.is_empty() {
        eprintln!(
            "\n=== Low-Correlation Pairs (|r| < {}) ===",
            report.analysis.correlation_threshold
        );
        for pair in &report.low_correlation_pairs {
            eprintln!("  {} / {}: {:+.3}", pair.a, pair.b, pair.correlation);
        }
    }

    let alloc = &report.allocation;
    if !alloc.weights.is_empty() {
        eprintln!("\n=== Allocation ===");
        if alloc.equal_weighted {
            eprintln!("  (no positive Sharpe: equal weights)");
        }
        for (name, weight) in &alloc.weights {
            eprintln!("  {:<18} {:>6.1}%", name, weight * 100.0);
        }
        eprintln!("  blended return:   {:.2}%", alloc.blended_return * 100.0);
        eprintln!("  blended sharpe:   {:.2}", alloc.blended_sharpe);
        eprintln!("  blended max dd:   {:.1}%", alloc.blended_max_drawdown * 100.0);
    }

    let mc = &report.monte_carlo;
    if mc.runs > 0 {
        eprintln!("\n=== Monte Carlo ({} runs) ===", mc.runs);
        eprintln!("  mean:   {:+.4}", mc.mean);
        eprintln!("  median: {:+.4}", mc.median);
        eprintln!("  p5/p95: {:+.4} / {:+.4}", mc.p5, mc.p95);
        eprintln!("  worst:  {:+.4}", mc.worst);
        eprintln!("  best:   {:+.4}", mc.best);
    }
}
