//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for macross.
///
/// Structural misuse (bad parameters, empty or misaligned series, too few
/// walk-forward windows) is reported here. Numeric edge cases such as a mean
/// over an empty set are not errors; they surface as `None` in the results.
#[derive(Debug, thiserror::Error)]
pub enum MacrossError {
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("price series is empty")]
    EmptySeries,

    #[error("price series is not strictly increasing at {date}")]
    UnorderedSeries { date: NaiveDate },

    #[error("invalid close price {close} on {date}")]
    InvalidPrice { date: NaiveDate, close: f64 },

    #[error("record for {found} does not line up with series date {expected}")]
    Misaligned {
        expected: NaiveDate,
        found: NaiveDate,
    },

    #[error("insufficient windows: {reason}")]
    InsufficientWindows { reason: String },

    #[error("parameter grid contains no pair with long window > short window")]
    EmptyGrid,

    #[error("grid search cancelled after {evaluated} of {total} pairs")]
    Cancelled { evaluated: usize, total: usize },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MacrossError> for std::process::ExitCode {
    fn from(err: &MacrossError) -> Self {
        let code: u8 = match err {
            MacrossError::Io(_) | MacrossError::Cancelled { .. } => 1,
            MacrossError::ConfigParse { .. }
            | MacrossError::ConfigMissing { .. }
            | MacrossError::ConfigInvalid { .. } => 2,
            MacrossError::Data { .. }
            | MacrossError::UnorderedSeries { .. }
            | MacrossError::InvalidPrice { .. }
            | MacrossError::Misaligned { .. } => 3,
            MacrossError::InvalidParameter { .. } | MacrossError::EmptyGrid => 4,
            MacrossError::EmptySeries | MacrossError::InsufficientWindows { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
