//! JSON snapshot of a full run implementing ReportPort.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

use crate::domain::analysis::RunReport;
use crate::domain::error::ProbtraderError;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct JsonSnapshotAdapter;

impl JsonSnapshotAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Pretty-printed snapshot text, without the trailing newline.
    pub fn render(&self, report: &RunReport) -> Result<String, ProbtraderError> {
        Ok(serde_json::to_string_pretty(report)?)
    }

    /// Read back a snapshot written by [`ReportPort::write`].
    pub fn load(path: &str) -> Result<RunReport, ProbtraderError> {
        let file = File::open(path).map_err(|e| ProbtraderError::Report {
            reason: format!("failed to open {path}: {e}"),
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl ReportPort for JsonSnapshotAdapter {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), ProbtraderError> {
        let file = File::create(output_path).map_err(|e| ProbtraderError::Report {
            reason: format!("failed to create {output_path}: {e}"),
        })?;
        let json = self.render(report)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}
