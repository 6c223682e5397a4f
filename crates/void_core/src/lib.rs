//! # void_core - Void Engine Core
//!
//! Zero-dependency primitives shared by the scene and editor crates:
//! - **Sequence ids** for snapshots, change records and undo operations
//! - **Versions** for persisted document formats
//! - **Timestamps** with millisecond resolution

pub mod id;
pub mod time;
pub mod version;

pub use id::*;
pub use time::*;
pub use version::*;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::id::{IdGenerator, SequenceId};
    pub use crate::time::Timestamp;
    pub use crate::version::Version;
}
