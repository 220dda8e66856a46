//! Error types for the stroopmouse library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for dataset curation and extraction.
#[derive(Debug, Error)]
pub enum StroopmouseError {
    /// A store file could not be opened in the requested mode.
    #[error("Store unavailable at '{path}': {reason}")]
    StoreUnavailable { path: PathBuf, reason: String },

    /// A write to an open store failed (read-only handle, I/O failure).
    #[error("Store write failed: {0}")]
    StoreWriteFailed(String),

    /// The mouse is not present in the raw data repository (or dataset).
    #[error("Unknown mouse: {0}")]
    UnknownMouse(String),

    /// The date is not available on disk for this mouse.
    #[error("Unknown date '{date}' for mouse {mouse}")]
    UnknownDate { mouse: String, date: String },

    /// A date range endpoint is not among the available dates.
    #[error("Date '{date}' not found for mouse {mouse}")]
    DateNotFound { mouse: String, date: String },

    /// A block filename or number is not available for the date.
    #[error("Unknown block '{block}' for mouse {mouse} on {date}")]
    UnknownBlock {
        mouse: String,
        date: String,
        block: String,
    },

    /// A block filename too short to carry a block number.
    #[error("Malformed block file name: {0}")]
    MalformedBlockName(String),

    /// A requested field is missing from an included experiment.
    #[error("Field '{field}' not found in {experiment}")]
    FieldNotFound { field: String, experiment: String },

    /// Text data was used where numbers are required.
    #[error("Not numeric: {0}")]
    NotNumeric(String),

    /// Reshaping was asked to work on no sequences at all.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A curation command could not be parsed.
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Error reading or accessing a file or directory.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StroopmouseError {
    /// Whether the caller can retry with corrected input.
    ///
    /// Store failures abort the current operation; selection and command
    /// errors leave the dataset untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StroopmouseError::UnknownMouse(_)
                | StroopmouseError::UnknownDate { .. }
                | StroopmouseError::DateNotFound { .. }
                | StroopmouseError::UnknownBlock { .. }
                | StroopmouseError::UnknownCommand(_)
        )
    }
}

/// Result type alias for stroopmouse operations.
pub type Result<T> = std::result::Result<T, StroopmouseError>;
