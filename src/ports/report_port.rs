//! Report output port trait.

use crate::domain::analysis::RunReport;
use crate::domain::error::ProbtraderError;

/// Port for writing the outcome of a run.
pub trait ReportPort {
    fn write(&self, report: &RunReport, output_path: &str) -> Result<(), ProbtraderError>;
}
