//! Editor modes and transitions
//!
//! ```text
//!            play              pause
//!   Editor ───────►  Play  ───────────►  Pause
//!          ◄───────        ◄───────────
//!            stop              resume
//! ```
//!
//! Every other pair is rejected. In particular a paused session must be
//! resumed before it can be stopped.

mod controller;

pub use controller::{ModeController, ModeSettings, TransitionLog};

use core::fmt;

use serde::{Deserialize, Serialize};
use void_core::Timestamp;

/// Operating mode of the editor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorMode {
    /// Authoring; the only mode where edits are accepted
    #[default]
    Editor,
    /// Running a disposable copy of the authored scene
    Play,
    /// Play with the simulation halted
    Pause,
}

impl EditorMode {
    pub fn name(&self) -> &'static str {
        match self {
            EditorMode::Editor => "editor",
            EditorMode::Play => "play",
            EditorMode::Pause => "pause",
        }
    }

    /// Whether the authored scene accepts edits
    pub fn is_editable(&self) -> bool {
        matches!(self, EditorMode::Editor)
    }

    /// Whether a runtime copy of the scene exists
    pub fn is_running(&self) -> bool {
        matches!(self, EditorMode::Play | EditorMode::Pause)
    }

    /// Whether `self -> to` is an allowed transition
    pub fn can_transition_to(&self, to: EditorMode) -> bool {
        matches!(
            (self, to),
            (EditorMode::Editor, EditorMode::Play)
                | (EditorMode::Play, EditorMode::Editor)
                | (EditorMode::Play, EditorMode::Pause)
                | (EditorMode::Pause, EditorMode::Play)
        )
    }
}

impl fmt::Display for EditorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The stage of a transition that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionStep {
    SerializeScene,
    BuildRuntimeScene,
    LoadResources,
    StartSimulation,
    StopSimulation,
    RestoreScene,
    PauseSimulation,
    ResumeSimulation,
}

impl fmt::Display for TransitionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionStep::SerializeScene => "serializing the scene",
            TransitionStep::BuildRuntimeScene => "building the runtime scene",
            TransitionStep::LoadResources => "loading resources",
            TransitionStep::StartSimulation => "starting the simulation",
            TransitionStep::StopSimulation => "stopping the simulation",
            TransitionStep::RestoreScene => "restoring the scene",
            TransitionStep::PauseSimulation => "pausing the simulation",
            TransitionStep::ResumeSimulation => "resuming the simulation",
        };
        f.write_str(name)
    }
}

/// One attempted transition
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRecord {
    pub from: EditorMode,
    pub to: EditorMode,
    pub timestamp: Timestamp,
    pub success: bool,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        use EditorMode::*;
        assert!(Editor.can_transition_to(Play));
        assert!(Play.can_transition_to(Editor));
        assert!(Play.can_transition_to(Pause));
        assert!(Pause.can_transition_to(Play));

        assert!(!Editor.can_transition_to(Pause));
        assert!(!Pause.can_transition_to(Editor));
        assert!(!Editor.can_transition_to(Editor));
        assert!(!Play.can_transition_to(Play));
    }

    #[test]
    fn test_editability() {
        assert!(EditorMode::Editor.is_editable());
        assert!(!EditorMode::Play.is_editable());
        assert!(EditorMode::Pause.is_running());
        assert_eq!(EditorMode::default(), EditorMode::Editor);
    }
}
