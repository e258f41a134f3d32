//! Domain error types.

/// Top-level error type for probtrader.
#[derive(Debug, thiserror::Error)]
pub enum ProbtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid series {market}: {reason}")]
    InvalidSeries { market: String, reason: String },

    #[error("invalid signal: {reason}")]
    InvalidSignal { reason: String },

    #[error("no market data available")]
    NoData,

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl ProbtraderError {
    pub(crate) fn invalid_config(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ProbtraderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ProbtraderError> for std::process::ExitCode {
    fn from(err: &ProbtraderError) -> Self {
        let code: u8 = match err {
            ProbtraderError::Io(_) => 1,
            ProbtraderError::ConfigParse { .. }
            | ProbtraderError::ConfigMissing { .. }
            | ProbtraderError::ConfigInvalid { .. } => 2,
            ProbtraderError::DataSource { .. } | ProbtraderError::Csv(_) => 3,
            ProbtraderError::InvalidSignal { .. } => 4,
            ProbtraderError::NoData | ProbtraderError::InvalidSeries { .. } => 5,
            ProbtraderError::Report { .. } | ProbtraderError::Json(_) => 6,
        };
        std::process::ExitCode::from(code)
    }
}
