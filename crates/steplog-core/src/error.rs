//! Error types

use std::path::PathBuf;

use rerun::external::arrow::datatypes::DataType;
use rerun::external::arrow::error::ArrowError;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while loading recordings and extracting signals
#[derive(Error, Debug)]
pub enum Error {
    #[error("Cannot access '{}': {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid recording '{}': {message}", path.display())]
    Format { path: PathBuf, message: String },

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Recording stream error: {0}")]
    Stream(#[from] rerun::RecordingStreamError),

    #[error("Column '{column}' not found (available: {})", available.join(", "))]
    Schema {
        column: String,
        available: Vec<String>,
    },

    #[error("Column '{column}' of type {data_type} cannot be converted to {expected}")]
    Conversion {
        column: String,
        data_type: DataType,
        expected: &'static str,
    },

    #[error("Index column '{column}' has a null at row {row}")]
    NullIndex { column: String, row: usize },

    #[error("Invalid entity path: {0}")]
    InvalidEntityPath(String),

    #[error("Invalid entity path filter: {0}")]
    InvalidFilter(String),

    #[error("Invalid configuration '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

impl Error {
    pub(crate) fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a [`Error::Format`] with a displayable message
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Format {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
