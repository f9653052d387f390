//! Error types for fx_crossrates

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for fx_crossrates
#[derive(Error, Debug)]
pub enum FxError {
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Source format error: {0}")]
    SourceFormatError(String),

    #[error("Invalid rate for {currency} on {date}: {rate}")]
    InvalidRate {
        currency: String,
        date: NaiveDate,
        rate: f64,
    },

    #[error("Path unwritable: {}: {reason}", path.display())]
    PathUnwritable { path: PathBuf, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for fx_crossrates operations
pub type Result<T> = std::result::Result<T, FxError>;
