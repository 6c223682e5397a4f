//! Snapshot store
//!
//! Snapshots are immutable deep copies of a serialized scene. The store
//! keeps at most `capacity` of them and evicts the oldest first. Pinned
//! snapshots are never evicted; the mode controller pins the editor
//! snapshot for as long as play mode needs it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use void_core::{IdGenerator, Timestamp};
use void_scene::SceneDocument;

use crate::error::{EditorError, Result};

void_core::sequence_id!(
    /// Identifier of a stored snapshot
    SnapshotId,
    "snap"
);

/// Why a snapshot was taken
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    /// Authored scene captured on entering play mode
    Editor,
    /// Runtime scene captured on leaving play mode
    Runtime,
    /// User-requested restore point
    Checkpoint,
}

impl SnapshotKind {
    /// Whether the store tracks a current snapshot of this kind
    fn tracks_current(&self) -> bool {
        matches!(self, SnapshotKind::Editor | SnapshotKind::Runtime)
    }
}

/// Size information computed when a snapshot is taken
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub node_count: usize,
    pub byte_size: usize,
}

/// An immutable copy of a scene document
#[derive(Clone, Debug)]
pub struct Snapshot {
    id: SnapshotId,
    name: String,
    timestamp: Timestamp,
    kind: SnapshotKind,
    document: SceneDocument,
    metadata: SnapshotMetadata,
}

impl Snapshot {
    #[inline]
    pub fn id(&self) -> SnapshotId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    #[inline]
    pub fn kind(&self) -> SnapshotKind {
        self.kind
    }

    /// Read-only view of the stored document; use
    /// [`SnapshotStore::restore`] for a copy to build from
    #[inline]
    pub fn document(&self) -> &SceneDocument {
        &self.document
    }

    #[inline]
    pub fn metadata(&self) -> SnapshotMetadata {
        self.metadata
    }
}

/// Bounded store of snapshots
#[derive(Debug)]
pub struct SnapshotStore {
    snapshots: HashMap<SnapshotId, Snapshot>,
    current: HashMap<SnapshotKind, SnapshotId>,
    pinned: HashSet<SnapshotId>,
    capacity: usize,
    total_bytes: usize,
    ids: IdGenerator,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

impl SnapshotStore {
    pub const DEFAULT_CAPACITY: usize = 16;

    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: HashMap::new(),
            current: HashMap::new(),
            pinned: HashSet::new(),
            capacity: capacity.max(1),
            total_bytes: 0,
            ids: IdGenerator::new(),
        }
    }

    /// Store a deep copy of `document`
    pub fn create(&mut self, name: impl Into<String>, document: &SceneDocument, kind: SnapshotKind) -> SnapshotId {
        let id = SnapshotId(self.ids.next());
        let document = document.clone();
        let metadata = SnapshotMetadata {
            node_count: document.node_count(),
            byte_size: document.byte_size(),
        };
        let snapshot = Snapshot {
            id,
            name: name.into(),
            timestamp: Timestamp::now(),
            kind,
            document,
            metadata,
        };

        log::debug!(
            "Snapshot {} '{}' ({:?}): {} nodes, {} bytes",
            id,
            snapshot.name,
            kind,
            metadata.node_count,
            metadata.byte_size
        );

        self.total_bytes += metadata.byte_size;
        self.snapshots.insert(id, snapshot);
        if kind.tracks_current() {
            self.current.insert(kind, id);
        }

        self.evict_if_needed(id);
        id
    }

    /// A fresh copy of the stored document
    pub fn restore(&self, id: SnapshotId) -> Result<SceneDocument> {
        self.snapshots
            .get(&id)
            .map(|s| s.document.clone())
            .ok_or(EditorError::SnapshotNotFound(id))
    }

    pub fn get(&self, id: SnapshotId) -> Option<&Snapshot> {
        self.snapshots.get(&id)
    }

    pub fn contains(&self, id: SnapshotId) -> bool {
        self.snapshots.contains_key(&id)
    }

    /// The most recent editor or runtime snapshot
    pub fn current(&self, kind: SnapshotKind) -> Option<&Snapshot> {
        self.current.get(&kind).and_then(|id| self.snapshots.get(id))
    }

    /// All snapshots, oldest first
    pub fn list(&self) -> Vec<&Snapshot> {
        let mut list: Vec<&Snapshot> = self.snapshots.values().collect();
        list.sort_by_key(|s| (s.timestamp, s.id));
        list
    }

    pub fn remove(&mut self, id: SnapshotId) -> Option<Snapshot> {
        let snapshot = self.snapshots.remove(&id)?;
        self.total_bytes = self.total_bytes.saturating_sub(snapshot.metadata.byte_size);
        self.current.retain(|_, current| *current != id);
        self.pinned.remove(&id);
        Some(snapshot)
    }

    /// Exempt a snapshot from eviction
    pub fn pin(&mut self, id: SnapshotId) -> bool {
        if self.snapshots.contains_key(&id) {
            self.pinned.insert(id);
            true
        } else {
            false
        }
    }

    pub fn unpin(&mut self, id: SnapshotId) {
        self.pinned.remove(&id);
    }

    /// Remove the oldest unpinned snapshot
    pub fn evict_oldest(&mut self) -> Option<Snapshot> {
        self.evict_oldest_except(None)
    }

    fn evict_oldest_except(&mut self, keep: Option<SnapshotId>) -> Option<Snapshot> {
        let oldest = self
            .snapshots
            .values()
            .filter(|s| !self.pinned.contains(&s.id) && Some(s.id) != keep)
            .min_by_key(|s| (s.timestamp, s.id))
            .map(|s| s.id)?;
        let evicted = self.remove(oldest)?;
        log::warn!("Evicted snapshot {} '{}'", evicted.id, evicted.name);
        Some(evicted)
    }

    /// Trim to capacity; the snapshot just stored is never the one evicted
    fn evict_if_needed(&mut self, newest: SnapshotId) {
        while self.snapshots.len() > self.capacity {
            if self.evict_oldest_except(Some(newest)).is_none() {
                log::warn!(
                    "Snapshot store over capacity ({} > {}) with every older snapshot pinned",
                    self.snapshots.len(),
                    self.capacity
                );
                break;
            }
        }
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.current.clear();
        self.pinned.clear();
        self.total_bytes = 0;
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Sum of the stored documents' encoded sizes
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
