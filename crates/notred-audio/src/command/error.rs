//! Error types for command persistence

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or saving the command registry
#[derive(Debug, Error)]
pub enum CommandError {
    /// Failed to read or write a command document
    #[error("Command document I/O failed for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML
    #[error("Failed to parse command document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document has no top-level `Triggers` sequence
    #[error("Command document is corrupted: missing 'Triggers' sequence")]
    MissingTriggers,

    /// A trigger entry could not be read
    #[error("Malformed trigger entry {index}: {reason}")]
    MalformedEntry { index: usize, reason: String },

    #[error("Unknown action type '{0}'")]
    UnknownActionType(String),

    #[error("Unknown action context '{0}'")]
    UnknownActionContext(String),
}

/// Result type for command persistence
pub type CommandResult<T> = Result<T, CommandError>;
