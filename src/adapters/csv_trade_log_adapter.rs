//! CSV trade log implementing ReportPort.
//!
//! One row per closed trade across every strategy in the report.

use serde::Serialize;

use crate::domain::analysis::RunReport;
use crate::domain::error::ProbtraderError;
use crate::domain::position::ClosedTrade;
use crate::ports::report_port::ReportPort;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    strategy: &'a str,
    market: &'a str,
    signal: &'static str,
    entry_time: String,
    entry_price: f64,
    exit_time: String,
    exit_price: f64,
    pnl: f64,
    pnl_pct: f64,
    duration_hours: f64,
    exit_reason: &'static str,
    win: bool,
}

impl<'a> From<&'a ClosedTrade> for TradeRow<'a> {
    fn from(trade: &'a ClosedTrade) -> Self {
        TradeRow {
            strategy: &trade.strategy,
            market: &trade.market_id,
            signal: trade.direction.as_str(),
            entry_time: trade.entry_time.format(TIMESTAMP_FORMAT).to_string(),
            entry_price: trade.entry_price,
            exit_time: trade.exit_time.format(TIMESTAMP_FORMAT).to_string(),
            exit_price: trade.exit_price,
            pnl: trade.pnl,
            pnl_pct: trade.pnl_pct,
            duration_hours: trade.holding_hours(),
            exit_reason: trade.exit_reason.as_str(),
            win: trade.is_win(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CsvTradeLogAdapter;

impl CsvTradeLogAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Write the log to any sink; the header is written even with no trades.
    pub fn write_to<W: std::io::Write>(
        &self,
        report: &RunReport,
        sink: W,
    ) -> Result<(), ProbtraderError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(sink);
        writer.write_record([
            "strategy",
            "market",
            "signal",
            "entry_time",
            "entry_price",
            "exit_time",
            "exit_price",
            "pnl",
            "pnl_pct",
            "duration_hours",
            "exit_reason",
            "win",
        ])?;
        for trade in report.results.iter().flat_map(|r| &r.trades) {
            writer.serialize(TradeRow::from(trade))?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvTradeLogAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), ProbtraderError> {
        let file = std::fs::File::create(output_path).map_err(|e| ProbtraderError::Report {
            reason: format!("failed to create {output_path}: {e}"),
        })?;
        self.write_to(report, file)
    }
}
