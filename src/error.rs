//! Error types for the crash dashboard.
//!
//! Every failure surfaces to the user-facing layer as a readable message;
//! nothing here is retried automatically.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, aggregating or presenting crash data.
#[derive(Error, Debug)]
pub enum Error {
    /// The input file path does not resolve.
    #[error("crash data not found at {}", path.display())]
    ResourceNotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// A required column is absent or a value in it cannot be parsed.
    #[error("malformed data in column '{column}': {reason}")]
    DataFormat {
        /// Column that failed.
        column: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A month selection that has no crash records, or is not a month at all.
    #[error("no crash records for month {month}")]
    SelectionOutOfRange {
        /// The selected month number.
        month: u32,
    },

    /// The CSV reader failed.
    #[error("failed to read CSV: {0}")]
    Csv(#[from] polars::prelude::PolarsError),

    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    Config(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl Error {
    /// Shorthand for a [`Error::DataFormat`] on `column`.
    pub fn data_format(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataFormat {
            column: column.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias using the dashboard [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
