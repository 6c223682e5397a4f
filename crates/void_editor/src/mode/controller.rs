//! Mode controller
//!
//! Runs each transition as a sequential pipeline of steps. Only one
//! transition may be in flight; a second request fails immediately with
//! [`EditorError::TransitionConflict`]. A failed step discards the partial
//! work of that transition and leaves the previous mode in place.
//!
//! No lock is held across an `.await`.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use void_core::Timestamp;
use void_scene::{
    ActivationKind, DeserializeOptions, PendingActivation, PropertyValue, SceneDocument,
    SceneSerializer,
};

use super::{EditorMode, TransitionRecord, TransitionStep};
use crate::core::{SnapshotId, SnapshotKind, SnapshotStore};
use crate::error::{EditorError, Result};
use crate::events::{EditorEvent, EventBus};
use crate::integration::{share, ResourceLoader, SceneRenderer, SharedScene, SimulationDriver};

/// Bounded record of attempted transitions
#[derive(Debug)]
pub struct TransitionLog {
    records: VecDeque<TransitionRecord>,
    max_records: usize,
}

impl TransitionLog {
    pub const DEFAULT_MAX_RECORDS: usize = 64;

    fn new(max_records: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_records,
        }
    }

    fn push(&mut self, record: TransitionRecord) {
        self.records.push_back(record);
        while self.records.len() > self.max_records {
            self.records.pop_front();
        }
    }

    /// Oldest first
    pub fn records(&self) -> impl Iterator<Item = &TransitionRecord> {
        self.records.iter()
    }

    pub fn last(&self) -> Option<&TransitionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Releases the in-flight flag when a transition ends, however it ends
struct TransitionGuard<'a>(&'a AtomicBool);

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Settings fixed for the controller's lifetime
#[derive(Clone, Copy, Debug)]
pub struct ModeSettings {
    /// Store a runtime snapshot before leaving play mode
    pub capture_runtime_on_stop: bool,
    pub deserialize: DeserializeOptions,
}

impl Default for ModeSettings {
    fn default() -> Self {
        Self {
            capture_runtime_on_stop: true,
            deserialize: DeserializeOptions::default(),
        }
    }
}

/// Drives Editor / Play / Pause transitions for one authored scene
pub struct ModeController {
    serializer: SceneSerializer,
    authored: SharedScene,
    renderer: Arc<dyn SceneRenderer>,
    simulation: Arc<dyn SimulationDriver>,
    loader: Arc<dyn ResourceLoader>,
    snapshots: Arc<Mutex<SnapshotStore>>,
    events: Arc<EventBus>,
    settings: ModeSettings,

    mode: RwLock<EditorMode>,
    in_flight: AtomicBool,
    runtime: Mutex<Option<SharedScene>>,
    editor_snapshot: Mutex<Option<SnapshotId>>,
    log: Mutex<TransitionLog>,
}

impl ModeController {
    /// Create a controller in editor mode and hand the authored scene to
    /// the renderer
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        serializer: SceneSerializer,
        authored: SharedScene,
        renderer: Arc<dyn SceneRenderer>,
        simulation: Arc<dyn SimulationDriver>,
        loader: Arc<dyn ResourceLoader>,
        snapshots: Arc<Mutex<SnapshotStore>>,
        events: Arc<EventBus>,
        settings: ModeSettings,
    ) -> Self {
        renderer.set_scene(Arc::clone(&authored));
        Self {
            serializer,
            authored,
            renderer,
            simulation,
            loader,
            snapshots,
            events,
            settings,
            mode: RwLock::new(EditorMode::Editor),
            in_flight: AtomicBool::new(false),
            runtime: Mutex::new(None),
            editor_snapshot: Mutex::new(None),
            log: Mutex::new(TransitionLog::new(TransitionLog::DEFAULT_MAX_RECORDS)),
        }
    }

    pub fn mode(&self) -> EditorMode {
        *self.mode.read()
    }

    /// Whether a transition is executing right now
    pub fn is_transitioning(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// The authored scene handle; stays the same handle across play sessions
    pub fn authored_scene(&self) -> SharedScene {
        Arc::clone(&self.authored)
    }

    /// The runtime copy, present in play and pause modes
    pub fn runtime_scene(&self) -> Option<SharedScene> {
        self.runtime.lock().clone()
    }

    /// The editor snapshot taken on entering play mode
    pub fn editor_snapshot(&self) -> Option<SnapshotId> {
        *self.editor_snapshot.lock()
    }

    pub fn with_log<R>(&self, f: impl FnOnce(&TransitionLog) -> R) -> R {
        f(&self.log.lock())
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// Editor -> Play. From pause this resumes.
    pub async fn play(&self) -> Result<()> {
        let _guard = self.begin()?;
        match self.mode() {
            EditorMode::Editor => {
                let result = self.enter_play().await;
                self.finish(EditorMode::Editor, EditorMode::Play, result)
            }
            EditorMode::Pause => {
                let result = self.resume_simulation().await;
                self.finish(EditorMode::Pause, EditorMode::Play, result)
            }
            EditorMode::Play => self.reject(EditorMode::Play, EditorMode::Play),
        }
    }

    /// Play -> Editor
    pub async fn stop(&self) -> Result<()> {
        let _guard = self.begin()?;
        let from = self.mode();
        if from != EditorMode::Play {
            return self.reject(from, EditorMode::Editor);
        }
        let result = self.leave_play().await;
        self.finish(from, EditorMode::Editor, result)
    }

    /// Play -> Pause
    pub async fn pause(&self) -> Result<()> {
        let _guard = self.begin()?;
        let from = self.mode();
        if from != EditorMode::Play {
            return self.reject(from, EditorMode::Pause);
        }
        let result = self
            .simulation
            .pause()
            .await
            .map_err(|e| EditorError::step(TransitionStep::PauseSimulation, e));
        self.finish(from, EditorMode::Pause, result)
    }

    /// Pause -> Play
    pub async fn resume(&self) -> Result<()> {
        let _guard = self.begin()?;
        let from = self.mode();
        if from != EditorMode::Pause {
            return self.reject(from, EditorMode::Play);
        }
        let result = self.resume_simulation().await;
        self.finish(from, EditorMode::Play, result)
    }

    fn begin(&self) -> Result<TransitionGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("Mode transition requested while another is in progress");
            return Err(EditorError::TransitionConflict);
        }
        Ok(TransitionGuard(&self.in_flight))
    }

    fn reject(&self, from: EditorMode, to: EditorMode) -> Result<()> {
        let err = EditorError::InvalidTransition { from, to };
        self.record(from, to, Some(err.to_string()));
        Err(err)
    }

    /// Commit the new mode on success and record the attempt either way
    fn finish(&self, from: EditorMode, to: EditorMode, result: Result<()>) -> Result<()> {
        match result {
            Ok(()) => {
                *self.mode.write() = to;
                self.record(from, to, None);
                log::info!("Mode {} -> {}", from, to);
                self.events.publish(EditorEvent::ModeChanged { from, to });
                Ok(())
            }
            Err(e) => {
                log::error!("Mode {} -> {} failed: {}", from, to, e);
                self.record(from, to, Some(e.to_string()));
                Err(e)
            }
        }
    }

    fn record(&self, from: EditorMode, to: EditorMode, error: Option<String>) {
        self.log.lock().push(TransitionRecord {
            from,
            to,
            timestamp: Timestamp::now(),
            success: error.is_none(),
            error,
        });
    }

    async fn resume_simulation(&self) -> Result<()> {
        self.simulation
            .resume()
            .await
            .map_err(|e| EditorError::step(TransitionStep::ResumeSimulation, e))
    }

    // ------------------------------------------------------------------
    // Pipelines
    // ------------------------------------------------------------------

    fn scene_name(&self) -> String {
        let tree = self.authored.read();
        tree.root().name().to_string()
    }

    async fn enter_play(&self) -> Result<()> {
        let name = self.scene_name();
        let document = {
            let tree = self.authored.read();
            self.serializer
                .document(&tree, name.as_str())
                .map_err(|e| EditorError::step(TransitionStep::SerializeScene, e))?
        };

        // The store is only touched once the runtime is up, so a failed
        // start cannot evict anything
        let runtime = match self.start_runtime(&document).await {
            Ok(runtime) => runtime,
            Err(e) => {
                self.renderer.set_scene(Arc::clone(&self.authored));
                return Err(e);
            }
        };

        let snapshot_name = format!("{} (editor)", name);
        let snapshot_id = {
            let mut store = self.snapshots.lock();
            let id = store.create(snapshot_name.as_str(), &document, SnapshotKind::Editor);
            store.pin(id);
            id
        };
        *self.runtime.lock() = Some(runtime);
        *self.editor_snapshot.lock() = Some(snapshot_id);
        self.events.publish(EditorEvent::SnapshotCreated {
            id: snapshot_id,
            name: snapshot_name,
        });
        Ok(())
    }

    async fn start_runtime(&self, document: &SceneDocument) -> Result<SharedScene> {
        let scene = self
            .serializer
            .deserialize_document(document, self.settings.deserialize)
            .map_err(|e| EditorError::step(TransitionStep::BuildRuntimeScene, e))?;
        let activations = scene.activations;
        let runtime = share(scene.tree);

        self.load_resources(&runtime).await;

        self.renderer.set_scene(Arc::clone(&runtime));
        self.run_activations(&activations).await;

        self.simulation
            .start(Arc::clone(&runtime))
            .await
            .map_err(|e| EditorError::step(TransitionStep::StartSimulation, e))?;

        Ok(runtime)
    }

    async fn leave_play(&self) -> Result<()> {
        let snapshot_id = self
            .editor_snapshot()
            .ok_or_else(|| EditorError::step(TransitionStep::RestoreScene, "no editor snapshot"))?;

        let captured = if self.settings.capture_runtime_on_stop {
            self.capture_runtime()
        } else {
            None
        };

        // Build the restored tree before touching anything live
        let document = self
            .snapshots
            .lock()
            .restore(snapshot_id)
            .map_err(|e| EditorError::step(TransitionStep::RestoreScene, e))?;
        let restored = self
            .serializer
            .deserialize_document(&document, self.settings.deserialize)
            .map_err(|e| EditorError::step(TransitionStep::RestoreScene, e))?;

        self.simulation
            .stop()
            .await
            .map_err(|e| EditorError::step(TransitionStep::StopSimulation, e))?;

        // Nothing from the runtime tree flows back
        self.runtime.lock().take();
        *self.authored.write() = restored.tree;
        let runtime_id = {
            let mut store = self.snapshots.lock();
            store.unpin(snapshot_id);
            captured.map(|(name, document)| {
                let id = store.create(name.as_str(), &document, SnapshotKind::Runtime);
                (id, name)
            })
        };
        self.editor_snapshot.lock().take();
        if let Some((id, name)) = runtime_id {
            self.events.publish(EditorEvent::SnapshotCreated { id, name });
        }

        self.renderer.set_scene(Arc::clone(&self.authored));
        self.run_activations(&restored.activations).await;
        Ok(())
    }

    /// Serialize the runtime tree; stored only once the stop has succeeded
    fn capture_runtime(&self) -> Option<(String, SceneDocument)> {
        let runtime = self.runtime_scene()?;
        let name = format!("{} (runtime)", self.scene_name());
        let document = {
            let tree = runtime.read();
            self.serializer.document(&tree, name.as_str())
        };
        match document {
            Ok(document) => Some((name, document)),
            Err(e) => {
                log::warn!("Runtime snapshot skipped: {}", e);
                None
            }
        }
    }

    /// Load every asset referenced by the scene. Failures only warn.
    async fn load_resources(&self, scene: &SharedScene) {
        let paths = asset_paths(&self.serializer, &scene.read());
        for path in paths {
            match self.loader.load(&path).await {
                Ok(handle) => log::debug!("Loaded resource {} ({} bytes)", handle.path, handle.size),
                Err(e) => log::warn!("Failed to load resource '{}': {}", path, e),
            }
        }
    }

    /// Run deferred activations in discovery order
    pub async fn run_activations(&self, activations: &[PendingActivation]) {
        for activation in activations {
            match activation.kind {
                ActivationKind::CurrentCamera => {
                    if let Err(e) = self.renderer.set_current_camera(&activation.node).await {
                        log::warn!("Could not make {} the current camera: {}", activation.node, e);
                    }
                }
            }
        }
    }
}

impl std::fmt::Debug for ModeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeController")
            .field("mode", &self.mode())
            .field("transitioning", &self.is_transitioning())
            .field("editor_snapshot", &self.editor_snapshot())
            .finish()
    }
}

/// Non-empty asset paths held by the tree, in walk order, deduplicated
fn asset_paths(serializer: &SceneSerializer, tree: &void_scene::SceneTree) -> Vec<String> {
    let mut paths: Vec<String> = Vec::new();
    let Ok(order) = tree.walk(tree.root_id()) else {
        return paths;
    };
    for id in order {
        let Some(node) = tree.get(&id) else { continue };
        for (_, descriptor) in serializer.context().properties(node.type_tag()) {
            if !descriptor.is_asset() {
                continue;
            }
            if let Some(PropertyValue::String(path)) = descriptor.read(node) {
                if !path.is_empty() && !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
    }
    paths
}

