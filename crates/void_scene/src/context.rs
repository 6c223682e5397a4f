//! Reflection context: the registry and directory used together
//!
//! Built explicitly at startup, then shared read-only (usually behind an
//! `Arc`) by the serializer and the editor.

use crate::error::{Result, SceneError};
use crate::node::Node;
use crate::property::{PropertyDescriptor, PropertyMap, PropertyRegistry};
use crate::types::TypeDirectory;

/// Property registry and type directory for one set of node types
#[derive(Debug, Default)]
pub struct ReflectionContext {
    registry: PropertyRegistry,
    directory: TypeDirectory,
}

impl ReflectionContext {
    /// An empty context with no node types
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(registry: PropertyRegistry, directory: TypeDirectory) -> Self {
        Self { registry, directory }
    }

    /// A context with the built-in node types installed
    pub fn with_builtins() -> Self {
        let mut ctx = Self::new();
        crate::builtin::install(&mut ctx);
        ctx
    }

    /// Declare a node type: its parent, a constructor and its own properties.
    ///
    /// The constructor builds a node tagged `tag`; fields are seeded from
    /// defaults by [`instantiate`](Self::instantiate), not here.
    pub fn define_type(
        &mut self,
        tag: &str,
        parent: Option<&str>,
        properties: impl IntoIterator<Item = PropertyDescriptor>,
    ) -> &mut Self {
        self.registry.declare_type(tag, parent);
        for descriptor in properties {
            self.registry.register(tag, descriptor);
        }
        let owned_tag = tag.to_string();
        self.directory
            .register_type(tag, move |name| Node::new(owned_tag.as_str(), name));
        self
    }

    #[inline]
    pub fn registry(&self) -> &PropertyRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut PropertyRegistry {
        &mut self.registry
    }

    #[inline]
    pub fn directory(&self) -> &TypeDirectory {
        &self.directory
    }

    #[inline]
    pub fn directory_mut(&mut self) -> &mut TypeDirectory {
        &mut self.directory
    }

    /// Effective property set for a type tag
    pub fn properties(&self, tag: &str) -> PropertyMap {
        self.registry.resolve(tag)
    }

    /// Construct a node by tag, with every registered default stored in
    /// its field map
    pub fn instantiate(&self, tag: &str, name: &str) -> Result<Node> {
        let constructor = self.directory.lookup(tag).ok_or_else(|| SceneError::UnknownType {
            tag: tag.to_string(),
            node_id: String::new(),
        })?;
        let mut node = constructor(name);
        self.seed_defaults(&mut node);
        Ok(node)
    }

    /// Store registered defaults for properties the node does not yet hold.
    ///
    /// Defaults are written straight into the field map; they bypass
    /// setters, which only validate authored values.
    pub fn seed_defaults(&self, node: &mut Node) {
        for (name, descriptor) in self.registry.resolve(node.type_tag()) {
            if descriptor.has_getter() {
                continue;
            }
            if let Some(default) = descriptor.default() {
                if node.field(&name).is_none() {
                    node.set_field(name, default.clone());
                }
            }
        }
    }
}
