//! Error types for PR Watch.

use thiserror::Error;

/// Result type alias for PR Watch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for PR Watch.
#[derive(Error, Debug)]
pub enum Error {
    // Schema errors (10-19)
    #[error("invalid timestamp {value:?}: {reason}")]
    Timestamp { value: String, reason: String },

    #[error("header validation failed: {0}")]
    Header(String),

    #[error("unknown column: {0}")]
    UnknownColumn(String),

    // Table errors (20-29)
    #[error("malformed row at line {line}: {reason}")]
    Row { line: usize, reason: String },

    #[error("row {index} is missing a value for column {column}")]
    IncompleteRow { index: usize, column: String },

    #[error("rows are not in increasing timestamp order at index {index}")]
    UnorderedRows { index: usize },

    // Sampling/backfill contract errors (30-39)
    #[error("sample stride must be at least 1")]
    ZeroStride,

    #[error("index {index} is outside the sampled range [{first}, {last}]")]
    SampleBounds {
        index: usize,
        first: usize,
        last: usize,
    },

    #[error("sample set has no value for column {column} at index {index}")]
    SampleGap { index: usize, column: String },

    #[error("sample set is empty but the series has rows")]
    EmptySampleSet,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Timestamp { .. } => 10,
            Error::Header(_) => 11,
            Error::UnknownColumn(_) => 12,
            Error::Row { .. } => 20,
            Error::IncompleteRow { .. } => 21,
            Error::UnorderedRows { .. } => 22,
            Error::ZeroStride => 30,
            Error::SampleBounds { .. } => 31,
            Error::SampleGap { .. } => 32,
            Error::EmptySampleSet => 33,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Whether the error indicates a broken caller contract rather than
    /// bad input data. Contract errors must never be masked or retried.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::ZeroStride
                | Error::SampleBounds { .. }
                | Error::SampleGap { .. }
                | Error::EmptySampleSet
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = Error::SampleBounds {
            index: 5,
            first: 0,
            last: 4,
        };
        assert_eq!(err.code(), 31);
        assert!(err.is_contract_violation());

        let err = Error::IncompleteRow {
            index: 3,
            column: "copilot_nondraft".to_string(),
        };
        assert_eq!(err.code(), 21);
        assert!(!err.is_contract_violation());
    }
}
