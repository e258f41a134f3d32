//! CLI integration tests for command orchestration.
//!
//! Tests cover:
//! - Settings loading from INI text (load_settings, build_strategy)
//! - `validate`, `run` and `stress` against real files on disk
//! - Exit codes for config and data failures

mod common;

use clap::Parser;
use common::*;
use probtrader::adapters::file_config_adapter::FileConfigAdapter;
use probtrader::adapters::json_snapshot_adapter::JsonSnapshotAdapter;
use probtrader::cli::{self, Cli};
use probtrader::domain::error::ProbtraderError;
use probtrader::domain::series::DataOrigin;
use probtrader::domain::strategy::{Strategy, StrategyKind};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[backtest]
initial_capital = 1000
position_size = 0.5
max_positions = 4
fee_rate = 0.01
cash_reserve = 0.0
annualization_factor = 252

[analysis]
monte_carlo_runs = 100
monte_carlo_seed = 42
correlation_threshold = 0.3

[strategies]
enabled = momentum, fade

[strategy.momentum]
lookback = 3
threshold = 0.05
stop_loss = 0.1
target = 0.2
max_hold_hours = 720
"#;

fn write_data_dir(dir: &Path) {
    fs::write(
        dir.join("markets.csv"),
        "id,label,end_time\n\
         UP,Breakout market,2024-02-01\n\
         FLAT,Quiet market,2024-02-01\n",
    )
    .unwrap();

    let mut up = String::from("timestamp,price\n");
    let mut flat = String::from("timestamp,price\n");
    for (day, price) in breakout_prices().iter().enumerate() {
        up.push_str(&format!("2024-01-{:02},{price}\n", day + 1));
        flat.push_str(&format!("2024-01-{:02},0.5\n", day + 1));
    }
    fs::write(dir.join("UP.csv"), up).unwrap();
    fs::write(dir.join("FLAT.csv"), flat).unwrap();
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

mod settings_loading {
    use super::*;

    #[test]
    fn valid_ini_builds_settings() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let settings = cli::load_settings(&adapter).unwrap();

        assert_eq!(settings.backtest.initial_capital, 1000.0);
        assert_eq!(settings.backtest.lifecycle.max_positions, 4);
        assert_eq!(settings.analysis.monte_carlo_seed, Some(42));
        assert_eq!(settings.strategies.len(), 2);
        assert_eq!(settings.strategies[0], quick_momentum());
        assert_eq!(settings.strategies[1].kind(), StrategyKind::Fade);
    }

    #[test]
    fn unknown_strategy_is_config_error() {
        let adapter =
            FileConfigAdapter::from_string("[strategies]\nenabled = momentum, astrology\n").unwrap();
        assert!(matches!(
            cli::load_settings(&adapter),
            Err(ProbtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[strategy.fade]\nstop_loss = 1.5\n").unwrap();
        assert!(matches!(
            cli::load_settings(&adapter),
            Err(ProbtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn non_numeric_backtest_value_is_rejected() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\ninitial_capital = lots\n").unwrap();
        assert!(matches!(
            cli::load_settings(&adapter),
            Err(ProbtraderError::ConfigInvalid { .. })
        ));
    }

    #[test]
    fn build_strategy_without_section_uses_defaults() {
        let adapter = FileConfigAdapter::from_string("[backtest]\n").unwrap();
        for kind in StrategyKind::ALL {
            assert_eq!(
                cli::build_strategy(kind, &adapter),
                Strategy::with_defaults(kind)
            );
        }
    }

    #[test]
    fn expiry_overrides_applied() {
        let adapter = FileConfigAdapter::from_string(
            "[strategy.expiry]\nwindow_hours = 48\nfavourite = 0.9\nlongshot = 0.1\n",
        )
        .unwrap();
        match cli::build_strategy(StrategyKind::Expiry, &adapter) {
            Strategy::Expiry(p) => {
                assert_eq!(p.window_hours, 48);
                assert_eq!(p.favourite, 0.9);
                assert_eq!(p.longshot, 0.1);
            }
            other => panic!("expected expiry, got {other:?}"),
        }
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let ini = write_temp_ini(VALID_INI);
        let code = cli::run(Cli::parse_from([
            "probtrader",
            "validate",
            "--config",
            &path_arg(ini.path()),
        ]));
        assert!(is_success(code));
    }

    #[test]
    fn invalid_value_exits_with_config_code() {
        let ini = write_temp_ini("[backtest]\nposition_size = 2.0\n");
        let code = cli::run(Cli::parse_from([
            "probtrader",
            "validate",
            "--config",
            &path_arg(ini.path()),
        ]));
        assert!(exit_code_is(code, 2));
    }

    #[test]
    fn non_numeric_value_exits_with_config_code() {
        let ini = write_temp_ini("[backtest]\ninitial_capital = lots\nfee_rate = 1%\n");
        let code = cli::run(Cli::parse_from([
            "probtrader",
            "validate",
            "--config",
            &path_arg(ini.path()),
        ]));
        assert!(exit_code_is(code, 2));
    }

    #[test]
    fn oversized_hold_exits_with_config_code() {
        let ini = write_temp_ini("[strategy.momentum]\nmax_hold_hours = 10000000000000\n");
        let code = cli::run(Cli::parse_from([
            "probtrader",
            "validate",
            "--config",
            &path_arg(ini.path()),
        ]));
        assert!(exit_code_is(code, 2));
    }

    #[test]
    fn missing_config_file_exits_with_config_code() {
        let code = cli::run(Cli::parse_from([
            "probtrader",
            "validate",
            "--config",
            "/nonexistent/probtrader.ini",
        ]));
        assert!(exit_code_is(code, 2));
    }
}

mod run_command {
    use super::*;

    #[test]
    fn replay_writes_snapshot_and_trade_log() {
        let ini = write_temp_ini(VALID_INI);
        let data = TempDir::new().unwrap();
        write_data_dir(data.path());
        let out = TempDir::new().unwrap();
        let report_path = out.path().join("report.json");
        let trades_path = out.path().join("trades.csv");

        let code = cli::run(Cli::parse_from([
            "probtrader",
            "run",
            "--config",
            &path_arg(ini.path()),
            "--data",
            &path_arg(data.path()),
            "--output",
            &path_arg(&report_path),
            "--trades",
            &path_arg(&trades_path),
        ]));
        assert!(is_success(code));

        let report = JsonSnapshotAdapter::load(&path_arg(&report_path)).unwrap();
        assert_eq!(report.origin, DataOrigin::Historical);
        assert_eq!(report.markets, 2);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.monte_carlo.runs, 100);

        let momentum = &report.results[0];
        assert_eq!(momentum.strategy, "momentum");
        assert_eq!(momentum.metrics.total_trades, 1);

        let log = fs::read_to_string(&trades_path).unwrap();
        let mut lines = log.lines();
        assert!(lines.next().unwrap().starts_with("strategy,market,"));
        let total: usize = report.results.iter().map(|r| r.trades.len()).sum();
        assert_eq!(lines.count(), total);
    }

    #[test]
    fn same_seed_reproduces_report() {
        let ini = write_temp_ini(VALID_INI);
        let data = TempDir::new().unwrap();
        write_data_dir(data.path());
        let out = TempDir::new().unwrap();

        let mut reports = Vec::new();
        for name in ["first.json", "second.json"] {
            let path = out.path().join(name);
            let code = cli::run(Cli::parse_from([
                "probtrader",
                "run",
                "--config",
                &path_arg(ini.path()),
                "--data",
                &path_arg(data.path()),
                "--output",
                &path_arg(&path),
            ]));
            assert!(is_success(code));
            reports.push(JsonSnapshotAdapter::load(&path_arg(&path)).unwrap());
        }
        assert_eq!(reports[0], reports[1]);
    }

    #[test]
    fn missing_catalogue_exits_with_data_code() {
        let ini = write_temp_ini(VALID_INI);
        let data = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();

        let code = cli::run(Cli::parse_from([
            "probtrader",
            "run",
            "--config",
            &path_arg(ini.path()),
            "--data",
            &path_arg(data.path()),
            "--output",
            &path_arg(&out.path().join("report.json")),
        ]));
        assert!(exit_code_is(code, 3));
        assert!(!out.path().join("report.json").exists());
    }

    #[test]
    fn catalogue_without_loadable_series_is_no_data() {
        let ini = write_temp_ini(VALID_INI);
        let data = TempDir::new().unwrap();
        fs::write(
            data.path().join("markets.csv"),
            "id,label,end_time\nGHOST,No series file,2024-02-01\n",
        )
        .unwrap();
        let out = TempDir::new().unwrap();

        let code = cli::run(Cli::parse_from([
            "probtrader",
            "run",
            "--config",
            &path_arg(ini.path()),
            "--data",
            &path_arg(data.path()),
            "--output",
            &path_arg(&out.path().join("report.json")),
        ]));
        assert!(exit_code_is(code, 5));
    }
}

mod stress_command {
    use super::*;

    #[test]
    fn stress_report_is_tagged_synthetic() {
        let ini = write_temp_ini(VALID_INI);
        let out = TempDir::new().unwrap();
        let report_path = out.path().join("stress.json");

        let code = cli::run(Cli::parse_from([
            "probtrader",
            "stress",
            "--config",
            &path_arg(ini.path()),
            "--markets",
            "3",
            "--samples",
            "60",
            "--seed",
            "9",
            "--output",
            &path_arg(&report_path),
        ]));
        assert!(is_success(code));

        let report = JsonSnapshotAdapter::load(&path_arg(&report_path)).unwrap();
        assert!(report.is_synthetic());
        assert_eq!(report.markets, 3);
        assert!(
            report
                .results
                .iter()
                .all(|r| r.origin == DataOrigin::Synthetic)
        );
    }

    #[test]
    fn zero_markets_is_no_data() {
        let ini = write_temp_ini(VALID_INI);
        let out = TempDir::new().unwrap();

        let code = cli::run(Cli::parse_from([
            "probtrader",
            "stress",
            "--config",
            &path_arg(ini.path()),
            "--markets",
            "0",
            "--output",
            &path_arg(&out.path().join("stress.json")),
        ]));
        assert!(exit_code_is(code, 5));
    }
}
