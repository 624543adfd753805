use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, CombineError>;

/// Error type covering the different failure cases that can occur when the
/// tool ingests, reconciles, or emits measurement datasets.
#[derive(Debug, Error)]
pub enum CombineError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the CSV reader or writer.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when JSON serialization of the diagnostics report fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a dataset lacks a column its schema requires. Fatal: a
    /// source that cannot be keyed or valued cannot be scored.
    #[error("table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    /// Raised when numeric parsing fails while rebuilding typed values.
    #[error("invalid numeric value '{value}' in column '{column}' of table '{table}'")]
    InvalidNumber {
        table: String,
        column: String,
        value: String,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input path not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the reference dataset contains no data rows.
    #[error("reference dataset is empty: {0}")]
    EmptyReference(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
