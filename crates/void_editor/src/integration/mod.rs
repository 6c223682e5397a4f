//! Integration with systems outside the editor core.
//!
//! The renderer, the simulation and the resource loader are reached only
//! through these traits. Headless implementations are provided for tools
//! and tests.

mod headless;

pub use headless::{FileResourceLoader, HeadlessRenderer, NullResourceLoader, NullSimulation};

use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use void_scene::{NodeId, SceneTree};

/// A live tree shared between the editor and its collaborators
pub type SharedScene = Arc<RwLock<SceneTree>>;

/// Wrap a tree for sharing
pub fn share(tree: SceneTree) -> SharedScene {
    Arc::new(RwLock::new(tree))
}

/// Result type for collaborator calls; errors are plain messages
pub type BoundaryResult<T> = std::result::Result<T, String>;

/// Displays whichever scene it was last handed
pub trait SceneRenderer: Send + Sync {
    fn set_scene(&self, scene: SharedScene);

    fn current_scene(&self) -> Option<SharedScene>;

    /// Make the given camera node the active view
    fn set_current_camera<'a>(&'a self, camera: &'a NodeId) -> BoxFuture<'a, BoundaryResult<()>>;
}

/// Drives a running scene
pub trait SimulationDriver: Send + Sync {
    fn start(&self, scene: SharedScene) -> BoxFuture<'_, BoundaryResult<()>>;

    fn stop(&self) -> BoxFuture<'_, BoundaryResult<()>>;

    fn pause(&self) -> BoxFuture<'_, BoundaryResult<()>>;

    fn resume(&self) -> BoxFuture<'_, BoundaryResult<()>>;
}

/// A resource that finished loading
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceHandle {
    pub path: String,
    pub size: u64,
}

/// Loads the external resources that asset properties point at
pub trait ResourceLoader: Send + Sync {
    fn load<'a>(&'a self, path: &'a str) -> BoxFuture<'a, BoundaryResult<ResourceHandle>>;
}
