//! Editor session
//!
//! Owns the authored scene and everything that tracks it. Every edit is
//! applied to the live tree, recorded in the change log and pushed onto
//! the undo history with closures that can re-apply and revert it.
//!
//! Structural edits capture the affected subtree as a [`SerializedNode`],
//! so undoing a delete restores the exact nodes, ids included.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use void_scene::builtin::SCENE;
use void_scene::{
    DeserializeOptions, DeserializeReport, NodeId, PendingActivation, PlainValue, PropertyDescriptor,
    PropertyValue, ReflectionContext, SceneDocument, SceneError, SceneSerializer, SceneTree,
    SerializedNode, ValueCodec,
};

use crate::core::{
    ChangeKind, ChangeLog, EditorPreferences, SnapshotId, SnapshotKind, SnapshotStore, UndoHistory,
};
use crate::error::{EditorError, Result};
use crate::events::{EditorEvent, EventBus};
use crate::integration::{
    share, HeadlessRenderer, NullResourceLoader, NullSimulation, ResourceLoader, SceneRenderer,
    SharedScene, SimulationDriver,
};
use crate::mode::{EditorMode, ModeController, ModeSettings};

/// Name given to scenes created without one
pub const UNTITLED: &str = "Untitled";

/// Outcome of loading a document into the session
#[derive(Debug)]
pub struct SceneLoad {
    pub report: DeserializeReport,
    /// Activations found in the document; already run against the renderer
    pub activations: Vec<PendingActivation>,
}

/// External systems the session drives
pub struct Collaborators {
    pub renderer: Arc<dyn SceneRenderer>,
    pub simulation: Arc<dyn SimulationDriver>,
    pub loader: Arc<dyn ResourceLoader>,
}

impl Collaborators {
    /// Collaborators that render nothing and simulate nothing
    pub fn headless() -> Self {
        Self {
            renderer: Arc::new(HeadlessRenderer::new()),
            simulation: Arc::new(NullSimulation::new()),
            loader: Arc::new(NullResourceLoader),
        }
    }
}

/// One open scene and its editing state
pub struct EditorSession {
    serializer: SceneSerializer,
    scene: SharedScene,
    history: UndoHistory,
    changes: ChangeLog,
    snapshots: Arc<Mutex<SnapshotStore>>,
    events: Arc<EventBus>,
    controller: ModeController,
    preferences: EditorPreferences,
    scene_path: Option<PathBuf>,
}

impl EditorSession {
    /// A headless session holding an empty scene
    pub fn new(context: Arc<ReflectionContext>, preferences: EditorPreferences) -> Result<Self> {
        Self::with_collaborators(context, preferences, Collaborators::headless())
    }

    pub fn with_collaborators(
        context: Arc<ReflectionContext>,
        preferences: EditorPreferences,
        collaborators: Collaborators,
    ) -> Result<Self> {
        let root = context.instantiate(SCENE, UNTITLED)?;
        let scene = share(SceneTree::new(root));
        let serializer = SceneSerializer::new(context);
        let snapshots = Arc::new(Mutex::new(SnapshotStore::new(preferences.snapshot_capacity)));
        let events = Arc::new(EventBus::new());

        let controller = ModeController::new(
            serializer.clone(),
            Arc::clone(&scene),
            collaborators.renderer,
            collaborators.simulation,
            collaborators.loader,
            Arc::clone(&snapshots),
            Arc::clone(&events),
            ModeSettings {
                capture_runtime_on_stop: preferences.capture_runtime_on_stop,
                deserialize: preferences.deserialize_options(),
            },
        );

        Ok(Self {
            serializer,
            scene,
            history: UndoHistory::with_capacity(preferences.max_undo),
            changes: ChangeLog::new(preferences.max_changes),
            snapshots,
            events,
            controller,
            preferences,
            scene_path: None,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The authored scene. The handle stays valid for the session's lifetime.
    pub fn scene(&self) -> SharedScene {
        Arc::clone(&self.scene)
    }

    pub fn serializer(&self) -> &SceneSerializer {
        &self.serializer
    }

    pub fn context(&self) -> &Arc<ReflectionContext> {
        self.serializer.context()
    }

    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    pub fn mode(&self) -> EditorMode {
        self.controller.mode()
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    pub fn snapshots(&self) -> Arc<Mutex<SnapshotStore>> {
        Arc::clone(&self.snapshots)
    }

    pub fn preferences(&self) -> &EditorPreferences {
        &self.preferences
    }

    pub fn scene_path(&self) -> Option<&Path> {
        self.scene_path.as_deref()
    }

    pub fn subscribe(&self) -> Receiver<EditorEvent> {
        self.events.subscribe()
    }

    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    pub fn root_id(&self) -> NodeId {
        self.scene.read().root_id().clone()
    }

    pub fn scene_name(&self) -> String {
        self.scene.read().root().name().to_string()
    }

    // ------------------------------------------------------------------
    // Mode transitions
    // ------------------------------------------------------------------

    pub async fn play(&self) -> Result<()> {
        self.controller.play().await
    }

    pub async fn stop(&self) -> Result<()> {
        self.controller.stop().await
    }

    pub async fn pause(&self) -> Result<()> {
        self.controller.pause().await
    }

    pub async fn resume(&self) -> Result<()> {
        self.controller.resume().await
    }

    fn ensure_editable(&self) -> Result<()> {
        if self.controller.is_transitioning() {
            return Err(EditorError::TransitionConflict);
        }
        let mode = self.controller.mode();
        if !mode.is_editable() {
            return Err(EditorError::NotEditable(mode));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Edit commands
    // ------------------------------------------------------------------

    /// Add a new node of `type_tag` as the last child of `parent`
    pub fn create_node(&mut self, parent: &NodeId, type_tag: &str, name: &str) -> Result<NodeId> {
        self.ensure_editable()?;
        let node = self.context().instantiate(type_tag, name)?;

        let (id, serialized, index) = {
            let mut tree = self.scene.write();
            let id = tree.add_child(parent, node)?;
            let serialized = self.serializer.serialize(&tree, &id)?;
            let index = tree.index_in_parent(&id).unwrap_or(0);
            (id, serialized, index)
        };

        self.push_insertion(format!("Create {}", name), parent.clone(), index, serialized);
        self.changes.record(
            ChangeKind::Hierarchy,
            id.clone(),
            format!("created {} '{}'", type_tag, name),
            None,
            None,
            true,
        );
        self.events.publish(EditorEvent::NodeAdded {
            node: id.clone(),
            parent: parent.clone(),
        });
        self.publish_history();
        Ok(id)
    }

    /// Remove a node and its subtree
    pub fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        self.ensure_editable()?;
        let (serialized, parent, index) = {
            let mut tree = self.scene.write();
            if id == tree.root_id() {
                return Err(SceneError::RootOperation("remove").into());
            }
            let serialized = self.serializer.serialize(&tree, id)?;
            let parent = tree
                .parent_of(id)
                .cloned()
                .ok_or_else(|| SceneError::NodeNotFound(id.clone()))?;
            let index = tree.index_in_parent(id).unwrap_or(0);
            tree.remove(id)?;
            (serialized, parent, index)
        };

        let name = format!("Delete {}", serialized.name);
        let description = format!("deleted {} '{}'", serialized.type_tag, serialized.name);
        self.push_removal(name, parent, index, serialized);
        self.changes
            .record(ChangeKind::Hierarchy, id.clone(), description, None, None, true);
        self.events.publish(EditorEvent::NodeRemoved { node: id.clone() });
        self.publish_history();
        Ok(())
    }

    /// Write a property through its descriptor
    pub fn set_property(&mut self, id: &NodeId, property: &str, value: PropertyValue) -> Result<()> {
        self.ensure_editable()?;
        let (descriptor, old) = {
            let mut tree = self.scene.write();
            let node = tree.node_mut(id)?;
            let descriptor = self
                .context()
                .registry()
                .describe(node.type_tag(), property)
                .cloned()
                .ok_or_else(|| SceneError::UnknownProperty {
                    tag: node.type_tag().to_string(),
                    property: property.to_string(),
                })?;
            let old = descriptor.read(node);
            descriptor
                .write(node, value.clone())
                .map_err(|message| SceneError::PropertyAssignment {
                    node_id: id.clone(),
                    property: property.to_string(),
                    message,
                })?;
            (descriptor, old)
        };

        let old_plain = old.as_ref().and_then(|v| encode(v, &descriptor));
        let new_plain = encode(&value, &descriptor);

        let redo = property_writer(&self.scene, id.clone(), descriptor.clone(), Some(value));
        let undo = property_writer(&self.scene, id.clone(), descriptor, old);
        self.history.push(format!("Set {}", property), redo, undo);

        self.changes.record(
            ChangeKind::Property,
            id.clone(),
            format!("set {}", property),
            old_plain,
            new_plain,
            true,
        );
        self.events.publish(EditorEvent::PropertyChanged {
            node: id.clone(),
            property: property.to_string(),
        });
        self.publish_history();
        Ok(())
    }

    pub fn rename_node(&mut self, id: &NodeId, name: &str) -> Result<()> {
        self.ensure_editable()?;
        let old = {
            let mut tree = self.scene.write();
            let node = tree.node_mut(id)?;
            let old = node.name().to_string();
            node.set_name(name);
            old
        };

        let rename = |scene: &SharedScene, id: NodeId, name: String| {
            let scene = Arc::clone(scene);
            move || -> std::result::Result<(), String> {
                let mut tree = scene.write();
                let node = tree.node_mut(&id).map_err(|e| e.to_string())?;
                node.set_name(name.as_str());
                Ok(())
            }
        };
        self.history.push(
            format!("Rename {}", old),
            rename(&self.scene, id.clone(), name.to_string()),
            rename(&self.scene, id.clone(), old.clone()),
        );

        self.changes.record(
            ChangeKind::Property,
            id.clone(),
            "renamed",
            Some(PlainValue::String(old)),
            Some(PlainValue::String(name.to_string())),
            true,
        );
        self.events.publish(EditorEvent::NodeRenamed {
            node: id.clone(),
            name: name.to_string(),
        });
        self.publish_history();
        Ok(())
    }

    /// Move a node under a new parent, at `index` or last
    pub fn reparent_node(&mut self, id: &NodeId, new_parent: &NodeId, index: Option<usize>) -> Result<()> {
        self.ensure_editable()?;
        let (old_parent, old_index) = {
            let mut tree = self.scene.write();
            let old_parent = tree
                .parent_of(id)
                .cloned()
                .ok_or(SceneError::RootOperation("reparent"))?;
            let old_index = tree.index_in_parent(id).unwrap_or(0);
            tree.reparent(id, new_parent, index)?;
            (old_parent, old_index)
        };

        let mover = |scene: &SharedScene, id: NodeId, parent: NodeId, index: Option<usize>| {
            let scene = Arc::clone(scene);
            move || -> std::result::Result<(), String> {
                scene
                    .write()
                    .reparent(&id, &parent, index)
                    .map_err(|e| e.to_string())
            }
        };
        self.history.push(
            "Reparent",
            mover(&self.scene, id.clone(), new_parent.clone(), index),
            mover(&self.scene, id.clone(), old_parent.clone(), Some(old_index)),
        );

        self.changes.record(
            ChangeKind::Hierarchy,
            id.clone(),
            "reparented",
            Some(PlainValue::String(old_parent.to_string())),
            Some(PlainValue::String(new_parent.to_string())),
            true,
        );
        self.events.publish(EditorEvent::NodeReparented {
            node: id.clone(),
            parent: new_parent.clone(),
        });
        self.publish_history();
        Ok(())
    }

    /// Copy a node and its subtree with fresh ids, placed right after it
    pub fn duplicate_node(&mut self, id: &NodeId) -> Result<NodeId> {
        self.ensure_editable()?;
        let (copy, parent, index) = {
            let mut tree = self.scene.write();
            if id == tree.root_id() {
                return Err(SceneError::RootOperation("duplicate").into());
            }
            let original = self.serializer.serialize(&tree, id)?;
            let mut copy = SceneSerializer::regenerate_ids(&original);
            copy.name = format!("{} (copy)", original.name);

            let parent = tree
                .parent_of(id)
                .cloned()
                .ok_or_else(|| SceneError::NodeNotFound(id.clone()))?;
            let index = tree.index_in_parent(id).map_or(0, |i| i + 1);
            self.serializer.deserialize_into(
                &mut tree,
                &parent,
                index,
                &copy,
                DeserializeOptions::default(),
            )?;
            (copy, parent, index)
        };

        let copy_id = copy.id.clone();
        let name = format!("Duplicate {}", copy.name);
        self.push_insertion(name, parent.clone(), index, copy);
        self.changes.record(
            ChangeKind::Hierarchy,
            copy_id.clone(),
            format!("duplicated from {}", id),
            None,
            None,
            true,
        );
        self.events.publish(EditorEvent::NodeAdded {
            node: copy_id.clone(),
            parent,
        });
        self.publish_history();
        Ok(copy_id)
    }

    /// Group the edits made inside `f` into one undo step
    pub fn transaction<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        self.ensure_editable()?;
        self.history.begin_transaction(name);
        match f(self) {
            Ok(value) => {
                self.history.commit_transaction();
                self.publish_history();
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.history.rollback_transaction() {
                    log::error!("Rollback of '{}' failed: {}", name, rollback);
                }
                self.events.publish(EditorEvent::SceneReplaced { name: self.scene_name() });
                Err(e)
            }
        }
    }

    fn push_insertion(&mut self, name: String, parent: NodeId, index: usize, serialized: SerializedNode) {
        let id = serialized.id.clone();
        let insert = grafter(&self.scene, &self.serializer, parent, index, serialized);
        let remove = pruner(&self.scene, id);
        self.history.push(name, insert, remove);
    }

    fn push_removal(&mut self, name: String, parent: NodeId, index: usize, serialized: SerializedNode) {
        let id = serialized.id.clone();
        let insert = grafter(&self.scene, &self.serializer, parent, index, serialized);
        let remove = pruner(&self.scene, id);
        self.history.push(name, remove, insert);
    }

    // ------------------------------------------------------------------
    // History
    // ------------------------------------------------------------------

    pub fn undo(&mut self) -> Result<String> {
        self.ensure_editable()?;
        let result = self.history.undo();
        self.publish_history();
        result
    }

    pub fn redo(&mut self) -> Result<String> {
        self.ensure_editable()?;
        let result = self.history.redo();
        self.publish_history();
        result
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn publish_history(&self) {
        self.events.publish(EditorEvent::HistoryChanged {
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        });
    }

    // ------------------------------------------------------------------
    // Checkpoints
    // ------------------------------------------------------------------

    /// Store the authored scene as a named restore point
    pub fn create_checkpoint(&mut self, name: &str) -> Result<SnapshotId> {
        let document = self.document()?;
        let id = self
            .snapshots
            .lock()
            .create(name, &document, SnapshotKind::Checkpoint);
        self.events.publish(EditorEvent::SnapshotCreated {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Replace the authored scene with a stored snapshot. Undoable.
    pub fn restore_checkpoint(&mut self, id: SnapshotId) -> Result<()> {
        self.ensure_editable()?;
        let target = self.snapshots.lock().restore(id)?;
        let current = self.document()?;
        let options = self.preferences.deserialize_options();

        let restored = self.serializer.deserialize_document(&target, options)?;
        *self.scene.write() = restored.tree;

        let name = self
            .snapshots
            .lock()
            .get(id)
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| id.to_string());
        self.history.push(
            format!("Restore {}", name),
            replacer(&self.scene, &self.serializer, target, options),
            replacer(&self.scene, &self.serializer, current, options),
        );
        self.events.publish(EditorEvent::SceneReplaced { name: self.scene_name() });
        self.publish_history();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// The authored scene as a document
    pub fn document(&self) -> Result<SceneDocument> {
        let tree = self.scene.read();
        let name = tree.root().name().to_string();
        Ok(self.serializer.document(&tree, name)?)
    }

    /// Replace the authored scene with an empty one
    pub fn new_scene(&mut self, name: &str) -> Result<()> {
        self.ensure_editable()?;
        let root = self.context().instantiate(SCENE, name)?;
        self.replace_scene(SceneTree::new(root));
        self.scene_path = None;
        Ok(())
    }

    /// Replace the authored scene with a document's contents and run its
    /// activations. History is cleared; the load cannot be undone.
    pub async fn load_document(&mut self, document: &SceneDocument) -> Result<SceneLoad> {
        self.ensure_editable()?;
        let scene = self
            .serializer
            .deserialize_document(document, self.preferences.deserialize_options())?;
        if !scene.report.is_clean() {
            log::warn!(
                "Loaded '{}' with {} warnings",
                document.metadata.name,
                scene.report.warning_count()
            );
        }
        self.replace_scene(scene.tree);
        self.controller.run_activations(&scene.activations).await;
        Ok(SceneLoad {
            report: scene.report,
            activations: scene.activations,
        })
    }

    pub async fn open(&mut self, path: impl AsRef<Path>) -> Result<SceneLoad> {
        self.ensure_editable()?;
        let path = path.as_ref();
        let document = SceneDocument::load(path)?;
        let load = self.load_document(&document).await?;
        self.scene_path = Some(path.to_path_buf());
        self.preferences.add_recent_scene(path.to_path_buf());
        Ok(load)
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let document = self.document()?;
        document.save(path, self.preferences.pretty_documents)?;
        self.history.mark_saved();
        self.scene_path = Some(path.to_path_buf());
        self.preferences.add_recent_scene(path.to_path_buf());
        Ok(())
    }

    fn replace_scene(&mut self, tree: SceneTree) {
        *self.scene.write() = tree;
        self.history.clear();
        self.changes.clear();
        self.events.publish(EditorEvent::SceneReplaced { name: self.scene_name() });
        self.publish_history();
    }
}

impl std::fmt::Debug for EditorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorSession")
            .field("scene", &self.scene_name())
            .field("mode", &self.mode())
            .field("history", &self.history)
            .field("scene_path", &self.scene_path)
            .finish()
    }
}

fn encode(value: &PropertyValue, descriptor: &PropertyDescriptor) -> Option<PlainValue> {
    ValueCodec::encode(value, descriptor.ty()).ok()
}

/// Closure writing `value` back through the descriptor; `None` clears the
/// stored field
fn property_writer(
    scene: &SharedScene,
    id: NodeId,
    descriptor: PropertyDescriptor,
    value: Option<PropertyValue>,
) -> impl FnMut() -> std::result::Result<(), String> + Send + 'static {
    let scene = Arc::clone(scene);
    move || {
        let mut tree = scene.write();
        let node = tree.node_mut(&id).map_err(|e| e.to_string())?;
        match &value {
            Some(value) => descriptor.write(node, value.clone()),
            None => {
                node.remove_field(descriptor.name());
                Ok(())
            }
        }
    }
}

/// Closure grafting a serialized subtree back in at its recorded position
fn grafter(
    scene: &SharedScene,
    serializer: &SceneSerializer,
    parent: NodeId,
    index: usize,
    serialized: SerializedNode,
) -> impl FnMut() -> std::result::Result<(), String> + Send + 'static {
    let scene = Arc::clone(scene);
    let serializer = serializer.clone();
    move || {
        let mut tree = scene.write();
        serializer
            .deserialize_into(&mut tree, &parent, index, &serialized, DeserializeOptions::default())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Closure removing a subtree by id
fn pruner(scene: &SharedScene, id: NodeId) -> impl FnMut() -> std::result::Result<(), String> + Send + 'static {
    let scene = Arc::clone(scene);
    move || {
        scene
            .write()
            .remove(&id)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Closure swapping the whole authored scene for a document's contents
fn replacer(
    scene: &SharedScene,
    serializer: &SceneSerializer,
    document: SceneDocument,
    options: DeserializeOptions,
) -> impl FnMut() -> std::result::Result<(), String> + Send + 'static {
    let scene = Arc::clone(scene);
    let serializer = serializer.clone();
    move || {
        let restored = serializer
            .deserialize_document(&document, options)
            .map_err(|e| e.to_string())?;
        *scene.write() = restored.tree;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use void_scene::builtin::{CAMERA_3D, NODE_3D};
    use void_scene::Vec3;

    fn session() -> EditorSession {
        EditorSession::new(
            Arc::new(ReflectionContext::with_builtins()),
            EditorPreferences::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_undo_redo_keeps_id() {
        let mut session = session();
        let root = session.root_id();
        let id = session.create_node(&root, NODE_3D, "Cube").unwrap();
        assert!(session.scene().read().contains(&id));

        session.undo().unwrap();
        assert!(!session.scene().read().contains(&id));

        session.redo().unwrap();
        let scene = session.scene();
        let tree = scene.read();
        assert_eq!(tree.get(&id).unwrap().name(), "Cube");
        assert_eq!(tree.parent_of(&id), Some(&root));
    }

    #[test]
    fn test_delete_restores_subtree_in_place() {
        let mut session = session();
        let root = session.root_id();
        let first = session.create_node(&root, NODE_3D, "First").unwrap();
        let rig = session.create_node(&root, NODE_3D, "Rig").unwrap();
        let cam = session.create_node(&rig, CAMERA_3D, "Cam").unwrap();
        let last = session.create_node(&root, NODE_3D, "Last").unwrap();
        session
            .set_property(&cam, "fov", PropertyValue::Number(40.0))
            .unwrap();

        session.delete_node(&rig).unwrap();
        assert!(!session.scene().read().contains(&cam));

        session.undo().unwrap();
        let scene = session.scene();
        let tree = scene.read();
        assert_eq!(tree.children_of(&root), &[first, rig.clone(), last]);
        assert_eq!(tree.parent_of(&cam), Some(&rig));
        assert_eq!(tree.get(&cam).unwrap().field("fov"), Some(&PropertyValue::Number(40.0)));
    }

    #[test]
    fn test_set_property_validation_and_undo() {
        let mut session = session();
        let root = session.root_id();
        let node = session.create_node(&root, NODE_3D, "Box").unwrap();

        session
            .set_property(&node, "position", Vec3::new(1.0, 2.0, 3.0).into())
            .unwrap();
        assert!(matches!(
            session.set_property(&node, "position", PropertyValue::Number(1.0)),
            Err(EditorError::Scene(SceneError::PropertyAssignment { .. }))
        ));
        assert!(matches!(
            session.set_property(&node, "nonsense", PropertyValue::Number(1.0)),
            Err(EditorError::Scene(SceneError::UnknownProperty { .. }))
        ));

        session.undo().unwrap();
        let value = session.scene().read().get(&node).unwrap().field("position").cloned();
        assert_eq!(value, Some(PropertyValue::Vector3(Vec3::ZERO)));

        let record = session.changes().latest().unwrap();
        assert_eq!(record.kind, ChangeKind::Property);
        assert_eq!(record.new_value, Some(serde_json::json!({"x": 1.0, "y": 2.0, "z": 3.0})));
    }

    #[test]
    fn test_rename_and_reparent_round_trip() {
        let mut session = session();
        let root = session.root_id();
        let a = session.create_node(&root, NODE_3D, "A").unwrap();
        let b = session.create_node(&root, NODE_3D, "B").unwrap();

        session.rename_node(&a, "Alpha").unwrap();
        session.reparent_node(&a, &b, None).unwrap();
        assert_eq!(session.scene().read().parent_of(&a), Some(&b));

        session.undo().unwrap();
        session.undo().unwrap();
        let scene = session.scene();
        let tree = scene.read();
        assert_eq!(tree.children_of(&root), &[a.clone(), b]);
        assert_eq!(tree.get(&a).unwrap().name(), "A");
    }

    #[test]
    fn test_duplicate_gets_fresh_ids() {
        let mut session = session();
        let root = session.root_id();
        let rig = session.create_node(&root, NODE_3D, "Rig").unwrap();
        session.create_node(&rig, CAMERA_3D, "Cam").unwrap();

        let copy = session.duplicate_node(&rig).unwrap();
        {
            let scene = session.scene();
            let tree = scene.read();
            assert_ne!(copy, rig);
            assert_eq!(tree.index_in_parent(&copy), Some(1));
            assert_eq!(tree.get(&copy).unwrap().name(), "Rig (copy)");
            assert_eq!(tree.descendants(&copy).len(), 1);
            assert_eq!(tree.len(), 5);
        }

        session.undo().unwrap();
        assert_eq!(session.scene().read().len(), 3);
    }

    #[test]
    fn test_checkpoint_restore_is_undoable() {
        let mut session = session();
        let root = session.root_id();
        let keep = session.create_node(&root, NODE_3D, "Keep").unwrap();
        let checkpoint = session.create_checkpoint("before").unwrap();
        let extra = session.create_node(&root, NODE_3D, "Extra").unwrap();

        session.restore_checkpoint(checkpoint).unwrap();
        assert!(session.scene().read().contains(&keep));
        assert!(!session.scene().read().contains(&extra));

        session.undo().unwrap();
        assert!(session.scene().read().contains(&extra));
    }

    #[test]
    fn test_transaction_groups_edits() {
        let mut session = session();
        let root = session.root_id();
        let before = session.history().undo_count();

        let ids = session
            .transaction("Build rig", |s| {
                let rig = s.create_node(&root, NODE_3D, "Rig")?;
                let cam = s.create_node(&rig, CAMERA_3D, "Cam")?;
                Ok((rig, cam))
            })
            .unwrap();

        assert_eq!(session.history().undo_count(), before + 1);
        session.undo().unwrap();
        assert!(!session.scene().read().contains(&ids.0));
        session.redo().unwrap();
        assert!(session.scene().read().contains(&ids.1));
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("level.json");

        let mut session = session();
        let root = session.root_id();
        let node = session.create_node(&root, NODE_3D, "Saved").unwrap();
        session.save(&path).unwrap();
        assert!(!session.is_dirty());

        let mut other = self::session();
        let load = pollster::block_on(other.open(&path)).unwrap();
        assert!(load.report.is_clean());
        assert!(other.scene().read().contains(&node));
        assert!(!other.can_undo());
        assert_eq!(other.preferences().recent_scenes, vec![path.clone()]);
    }
}
