//! Error types for the turnwire CLI.

use thiserror::Error;
use turnwire::EncodeError;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// I/O error (reading input, writing output).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A JSONL input line that is not a valid record.
    #[error("Invalid record on line {line}: {source}")]
    Record {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A record whose messages cannot be encoded.
    #[error("Cannot encode record on line {line}: {source}")]
    Encode {
        line: usize,
        #[source]
        source: EncodeError,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using `CliError`.
pub type Result<T> = std::result::Result<T, CliError>;
