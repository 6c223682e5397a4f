//! Type directory: maps type tags to node constructors
//!
//! The directory is populated once at startup and then shared read-only,
//! in the manner of a plugin type registry.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeId};

/// Builds a detached node of one concrete type with the given name
pub type NodeConstructor = Arc<dyn Fn(&str) -> Node + Send + Sync>;

/// Inspects a freshly deserialized node and reports the activation it needs
pub type ActivationProbe = Arc<dyn Fn(&Node) -> Option<ActivationKind> + Send + Sync>;

/// Work that can only run once a node is attached to a live scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationKind {
    /// Make the camera the renderer's current camera
    CurrentCamera,
}

/// A deferred activation collected during deserialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingActivation {
    pub node: NodeId,
    pub kind: ActivationKind,
}

/// Registered constructors and activation probes, keyed by type tag
#[derive(Default, Clone)]
pub struct TypeDirectory {
    constructors: HashMap<String, NodeConstructor>,
    probes: HashMap<String, ActivationProbe>,
}

impl TypeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. A later registration for the same tag wins.
    pub fn register_type<F>(&mut self, tag: &str, constructor: F) -> &mut Self
    where
        F: Fn(&str) -> Node + Send + Sync + 'static,
    {
        if self
            .constructors
            .insert(tag.to_string(), Arc::new(constructor))
            .is_some()
        {
            log::debug!("Replaced constructor for node type '{}'", tag);
        }
        self
    }

    pub fn register_activation<F>(&mut self, tag: &str, probe: F) -> &mut Self
    where
        F: Fn(&Node) -> Option<ActivationKind> + Send + Sync + 'static,
    {
        self.probes.insert(tag.to_string(), Arc::new(probe));
        self
    }

    pub fn lookup(&self, tag: &str) -> Option<&NodeConstructor> {
        self.constructors.get(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Run the activation probe registered for the node's type, if any
    pub fn activation_for(&self, node: &Node) -> Option<ActivationKind> {
        self.probes.get(node.type_tag()).and_then(|probe| probe(node))
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl fmt::Debug for TypeDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDirectory")
            .field("types", &self.tags())
            .field("probes", &self.probes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::PropertyValue;

    #[test]
    fn test_register_and_construct() {
        let mut dir = TypeDirectory::new();
        dir.register_type("Marker", |name| Node::new("Marker", name));
        assert!(dir.contains("Marker"));
        assert!(!dir.contains("Other"));

        let node = (dir.lookup("Marker").unwrap())("m");
        assert_eq!(node.type_tag(), "Marker");
        assert_eq!(node.name(), "m");
        assert_eq!(dir.tags(), vec!["Marker"]);
    }

    #[test]
    fn test_activation_probe() {
        let mut dir = TypeDirectory::new();
        dir.register_activation("Cam", |node| {
            match node.field("current") {
                Some(PropertyValue::Boolean(true)) => Some(ActivationKind::CurrentCamera),
                _ => None,
            }
        });
        let mut cam = Node::new("Cam", "c");
        assert_eq!(dir.activation_for(&cam), None);
        cam.set_field("current", PropertyValue::Boolean(true));
        assert_eq!(dir.activation_for(&cam), Some(ActivationKind::CurrentCamera));
    }
}
