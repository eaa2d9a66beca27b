//! Error type for the command-line tools.

use castle_core::error::CastleError;
use thiserror::Error;

/// Errors raised by tool commands.
#[derive(Error, Debug)]
pub enum ToolError {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to encode JSON output.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// Failed to parse a RON rules file.
    #[error("Failed to parse rules: {0}")]
    Ron(#[from] ron::error::SpannedError),
    /// The engine rejected an operation or a snapshot.
    #[error("Engine error: {0}")]
    Engine(#[from] CastleError),
    /// Invalid command-line configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for tool operations.
pub type Result<T> = std::result::Result<T, ToolError>;
