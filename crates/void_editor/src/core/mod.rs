//! Core editor bookkeeping: history, change log, snapshots and preferences.

mod change_log;
mod history;
mod preferences;
mod snapshot;

pub use change_log::{ChangeId, ChangeKind, ChangeLog, ChangeRecord};
pub use history::{OperationId, Transaction, UndoFn, UndoHistory, UndoOperation};
pub use preferences::EditorPreferences;
pub use snapshot::{Snapshot, SnapshotId, SnapshotKind, SnapshotMetadata, SnapshotStore};
