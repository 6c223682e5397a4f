//! Void Engine Scene Editor
//!
//! Authoring state for reflection-driven scenes: undoable edits, snapshots
//! and the Editor / Play / Pause mode machine.
//!
//! ## Features
//!
//! - **Undo/Redo**: closure-based history with transactions
//! - **Change Log**: bounded record of every edit
//! - **Snapshots**: serialized restore points, pinned while in use
//! - **Play Mode**: runs a disposable copy; the authored scene is restored on stop
//! - **Preferences**: TOML file in the user's config directory
//!
//! ## Architecture
//!
//! ```text
//! EditorSession ──► SceneTree (authored, shared)
//!      │                 ▲
//!      ├─► UndoHistory   │ restore on stop
//!      ├─► ChangeLog     │
//!      └─► ModeController ──► SnapshotStore
//!               │
//!               └─► SceneRenderer / SimulationDriver / ResourceLoader
//! ```
//!
//! Edits are only accepted in Editor mode.

pub mod core;
pub mod error;
pub mod events;
pub mod integration;
pub mod mode;
pub mod session;

pub use core::{
    ChangeKind, ChangeLog, ChangeRecord, EditorPreferences, OperationId, Snapshot, SnapshotId,
    SnapshotKind, SnapshotStore, UndoHistory,
};
pub use error::{EditorError, Result};
pub use events::{EditorEvent, EventBus};
pub use integration::{
    share, BoundaryResult, FileResourceLoader, HeadlessRenderer, NullResourceLoader, NullSimulation,
    ResourceHandle, ResourceLoader, SceneRenderer, SharedScene, SimulationDriver,
};
pub use mode::{EditorMode, ModeController, ModeSettings, TransitionRecord, TransitionStep};
pub use session::{Collaborators, EditorSession, SceneLoad};

/// Editor version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Editor name
pub const NAME: &str = "Void Editor";
