//! Editor event bus
//!
//! UI consumers subscribe and drain their receiver at their own pace.
//! Receivers that have been dropped are pruned on the next publish.

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use void_scene::NodeId;

use crate::core::SnapshotId;
use crate::mode::EditorMode;

/// Notifications about authored scene and editor state changes
#[derive(Clone, Debug, PartialEq)]
pub enum EditorEvent {
    NodeAdded { node: NodeId, parent: NodeId },
    NodeRemoved { node: NodeId },
    PropertyChanged { node: NodeId, property: String },
    NodeRenamed { node: NodeId, name: String },
    NodeReparented { node: NodeId, parent: NodeId },
    /// The authored scene was replaced wholesale (open, new, restore)
    SceneReplaced { name: String },
    HistoryChanged { can_undo: bool, can_redo: bool },
    ModeChanged { from: EditorMode, to: EditorMode },
    SnapshotCreated { id: SnapshotId, name: String },
}

/// Fan-out publisher of [`EditorEvent`]s
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<EditorEvent>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&self) -> Receiver<EditorEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Send an event to every live subscriber
    pub fn publish(&self, event: EditorEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
