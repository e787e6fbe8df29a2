//! Error types for the telemark crate

use thiserror::Error;

/// Result type alias for telemark operations
pub type Result<T> = std::result::Result<T, TelemarkError>;

/// Main error type for the telemark crate
#[derive(Error, Debug)]
pub enum TelemarkError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Unknown label {label:?} for field {field}")]
    UnknownLabel { field: &'static str, label: String },

    #[error("Unknown code {code} for field {field}")]
    UnknownCode { field: &'static str, code: i64 },

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl TelemarkError {
    /// Whether this error rejects a single submission rather than the process.
    ///
    /// Configuration and IO failures are fatal at startup; everything a user
    /// can cause from the form is recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TelemarkError::UnknownLabel { .. }
                | TelemarkError::UnknownCode { .. }
                | TelemarkError::InvalidParameter { .. }
        )
    }
}

impl From<polars::error::PolarsError> for TelemarkError {
    fn from(err: polars::error::PolarsError) -> Self {
        TelemarkError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TelemarkError {
    fn from(err: serde_json::Error) -> Self {
        TelemarkError::SerializationError(err.to_string())
    }
}
