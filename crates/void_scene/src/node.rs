//! Scene nodes and their identifiers

use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::value::PropertyValue;

/// Opaque node identifier, unique within one tree or document
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A node in a scene tree.
///
/// Hierarchy links are maintained by [`crate::SceneTree`]; a detached node
/// has no parent and no children.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    name: String,
    type_tag: String,
    fields: HashMap<String, PropertyValue>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    /// Create a detached node with a freshly generated id
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(NodeId::generate(), type_tag, name)
    }

    pub fn with_id(id: NodeId, type_tag: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            type_tag: type_tag.into(),
            fields: HashMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    #[inline]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[inline]
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    /// Ordered child ids
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[inline]
    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    /// Directly stored property value
    pub fn field(&self, name: &str) -> Option<&PropertyValue> {
        self.fields.get(name)
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn remove_field(&mut self, name: &str) -> Option<PropertyValue> {
        self.fields.remove(name)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Replace the id of a node that is not yet part of a tree
    pub(crate) fn set_id(&mut self, id: NodeId) {
        self.id = id;
    }

    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    /// Strip hierarchy links, leaving only the node's own data
    pub(crate) fn detached(mut self) -> Self {
        self.children.clear();
        self.parent = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Node::new("Node", "a");
        let b = Node::new("Node", "b");
        assert_ne!(a.id(), b.id());
        assert!(!a.id().as_str().is_empty());
    }

    #[test]
    fn test_fields() {
        let mut node = Node::with_id(NodeId::from("n1"), "Node3D", "Cube");
        assert_eq!(node.id().to_string(), "n1");
        node.set_field("visible", PropertyValue::Boolean(false));
        assert_eq!(node.field("visible"), Some(&PropertyValue::Boolean(false)));
        assert_eq!(node.remove_field("visible"), Some(PropertyValue::Boolean(false)));
        assert!(node.field("visible").is_none());
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = NodeId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
