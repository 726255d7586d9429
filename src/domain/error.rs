//! Domain error types.
//!
//! Indicator and scoring code is total and never returns these; only the bar
//! store, configuration and I/O-adjacent boundaries do.

use chrono::NaiveDate;

/// Top-level error type for mtftrader.
#[derive(Debug, thiserror::Error)]
pub enum MtfError {
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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("bar for {symbol} dated {date} is not after the last stored bar {last}")]
    OutOfOrderBar {
        symbol: String,
        date: NaiveDate,
        last: NaiveDate,
    },

    #[error("malformed bar for {symbol} on {date}: {reason}")]
    MalformedBar {
        symbol: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MtfError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        MtfError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&MtfError> for std::process::ExitCode {
    fn from(err: &MtfError) -> Self {
        let code: u8 = match err {
            MtfError::Io(_) | MtfError::WorkerPool { .. } => 1,
            MtfError::ConfigParse { .. }
            | MtfError::ConfigMissing { .. }
            | MtfError::ConfigInvalid { .. } => 2,
            MtfError::DataSource { .. } => 3,
            MtfError::OutOfOrderBar { .. } | MtfError::MalformedBar { .. } => 4,
            MtfError::NoData { .. } | MtfError::InsufficientData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
