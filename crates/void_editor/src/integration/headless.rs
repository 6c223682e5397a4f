//! Collaborators for running without a window

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use void_scene::NodeId;

use super::{BoundaryResult, ResourceHandle, ResourceLoader, SceneRenderer, SharedScene, SimulationDriver};

/// Renderer that only remembers what it was asked to show
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    scene: Mutex<Option<SharedScene>>,
    camera: Mutex<Option<NodeId>>,
    scene_changes: AtomicUsize,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The camera most recently made current
    pub fn current_camera(&self) -> Option<NodeId> {
        self.camera.lock().clone()
    }

    /// Number of `set_scene` calls so far
    pub fn scene_changes(&self) -> usize {
        self.scene_changes.load(Ordering::Relaxed)
    }

    /// Whether the renderer currently shows exactly this handle
    pub fn is_showing(&self, scene: &SharedScene) -> bool {
        self.scene
            .lock()
            .as_ref()
            .map_or(false, |current| Arc::ptr_eq(current, scene))
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn set_scene(&self, scene: SharedScene) {
        *self.scene.lock() = Some(scene);
        *self.camera.lock() = None;
        self.scene_changes.fetch_add(1, Ordering::Relaxed);
    }

    fn current_scene(&self) -> Option<SharedScene> {
        self.scene.lock().clone()
    }

    fn set_current_camera<'a>(&'a self, camera: &'a NodeId) -> BoxFuture<'a, BoundaryResult<()>> {
        *self.camera.lock() = Some(camera.clone());
        log::debug!("Current camera: {}", camera);
        future::ready(Ok(())).boxed()
    }
}

/// Simulation that does nothing but track its state
#[derive(Debug, Default)]
pub struct NullSimulation {
    running: AtomicBool,
    paused: AtomicBool,
}

impl NullSimulation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }
}

impl SimulationDriver for NullSimulation {
    fn start(&self, _scene: SharedScene) -> BoxFuture<'_, BoundaryResult<()>> {
        self.running.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        future::ready(Ok(())).boxed()
    }

    fn stop(&self) -> BoxFuture<'_, BoundaryResult<()>> {
        self.running.store(false, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        future::ready(Ok(())).boxed()
    }

    fn pause(&self) -> BoxFuture<'_, BoundaryResult<()>> {
        self.paused.store(true, Ordering::Release);
        future::ready(Ok(())).boxed()
    }

    fn resume(&self) -> BoxFuture<'_, BoundaryResult<()>> {
        self.paused.store(false, Ordering::Release);
        future::ready(Ok(())).boxed()
    }
}

/// Loader that accepts every path without touching storage
#[derive(Debug, Default)]
pub struct NullResourceLoader;

impl ResourceLoader for NullResourceLoader {
    fn load<'a>(&'a self, path: &'a str) -> BoxFuture<'a, BoundaryResult<ResourceHandle>> {
        future::ready(Ok(ResourceHandle {
            path: path.to_string(),
            size: 0,
        }))
        .boxed()
    }
}

/// Loader that resolves resource paths against a root directory
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    root: PathBuf,
}

impl FileResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceLoader for FileResourceLoader {
    fn load<'a>(&'a self, path: &'a str) -> BoxFuture<'a, BoundaryResult<ResourceHandle>> {
        let full = self.root.join(path);
        let result = std::fs::metadata(&full)
            .map(|meta| ResourceHandle {
                path: path.to_string(),
                size: meta.len(),
            })
            .map_err(|e| format!("{}: {}", full.display(), e));
        future::ready(result).boxed()
    }
}
