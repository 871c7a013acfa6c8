//! Error types for editor/engine exchanges.
//!
//! Three classes of failure exist:
//! - I/O and JSON failures while touching exchange files (non-fatal, usually
//!   logged and degraded to "no data" by the transport layer)
//! - validation failures, raised before anything is written
//! - protocol outcomes: busy channel, engine-reported error

use std::path::PathBuf;
use thiserror::Error;

use crate::protocol::{Flag, Payload};

/// Result type alias for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;

/// Input rejected before any payload or flag was written.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Please enter a name")]
    EmptyName,

    #[error("Please select a {0}")]
    MissingSelection(&'static str),

    #[error("A node with name '{0}' already exists")]
    DuplicateName(String),

    #[error("Cannot remove or re-create root node '{0}'")]
    RootNode(String),

    #[error("Cannot delete the main scene")]
    MainScene,

    #[error("Invalid {field}: '{raw}'")]
    InvalidNumber { field: &'static str, raw: String },

    #[error("Coordinates must be between 0 and 1 (got {x}, {y})")]
    OutOfRange { x: f64, y: f64 },

    #[error("Operation not available in {0} mode")]
    ModeMismatch(&'static str),
}

/// Errors that can occur when talking to the engine
#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error on {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Channel {} still pending, refusing to overwrite its payload", .0.file_name())]
    ChannelBusy(Flag),

    #[error("Failed to write {}", .0.file_name())]
    PayloadWrite(Payload),

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Could not determine active scene")]
    NoActiveScene,
}

impl EditorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EditorError::Io { path: path.into(), source }
    }

    /// True for errors the user should see as a blocking notice.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            EditorError::Validation(_) | EditorError::Engine(_) | EditorError::NoActiveScene
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_converts() {
        let err: EditorError = ValidationError::MainScene.into();
        assert!(matches!(err, EditorError::Validation(ValidationError::MainScene)));
        assert!(err.is_user_facing());
        assert_eq!(err.to_string(), "Cannot delete the main scene");
    }

    #[test]
    fn test_busy_message_names_flag_file() {
        let err = EditorError::ChannelBusy(Flag::NodeOperation);
        assert!(err.to_string().contains("node_operation.flag"));
        assert!(!err.is_user_facing());
    }
}
