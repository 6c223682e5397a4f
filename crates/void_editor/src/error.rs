//! Editor error types

use thiserror::Error;
use void_scene::SceneError;

use crate::core::SnapshotId;
use crate::mode::{EditorMode, TransitionStep};

/// Errors raised by the editor session, history and mode controller
#[derive(Debug, Error)]
pub enum EditorError {
    /// Another mode transition is still in flight
    #[error("a mode transition is already in progress")]
    TransitionConflict,

    /// The requested transition is not allowed from the current mode
    #[error("cannot switch from {from} to {to}")]
    InvalidTransition { from: EditorMode, to: EditorMode },

    /// A step of a mode transition failed; the mode is unchanged
    #[error("{step} failed: {message}")]
    TransitionStep { step: TransitionStep, message: String },

    /// An undo or redo closure reported failure; the stacks are unchanged
    #[error("{action} of '{name}' failed: {message}")]
    UndoRedoExecution {
        action: &'static str,
        name: String,
        message: String,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    /// Authoring edits are only accepted in editor mode
    #[error("the scene cannot be edited in {0} mode")]
    NotEditable(EditorMode),

    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    #[error("scene error: {0}")]
    Scene(#[from] SceneError),

    #[error("preferences error: {0}")]
    Preferences(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditorError {
    pub(crate) fn step(step: TransitionStep, message: impl ToString) -> Self {
        EditorError::TransitionStep {
            step,
            message: message.to_string(),
        }
    }
}

/// Result type for editor operations
pub type Result<T> = std::result::Result<T, EditorError>;
