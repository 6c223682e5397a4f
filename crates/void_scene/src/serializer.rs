//! Reflection-driven conversion between live trees and documents
//!
//! Serialization reads each node's properties through the registry and
//! keeps only non-default, serializable values. Deserialization constructs
//! nodes by type tag, assigns each stored property through its descriptor
//! and attaches children in declared order.
//!
//! Property problems never abort a load: the property keeps its
//! constructed default and the failure is recorded in the
//! [`DeserializeReport`]. Unknown node types follow the configured
//! [`UnknownTypePolicy`].

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::context::ReflectionContext;
use crate::document::{SceneDocument, SerializedNode};
use crate::error::{Result, SceneError};
use crate::node::{Node, NodeId};
use crate::tree::SceneTree;
use crate::types::PendingActivation;
use crate::value::ValueCodec;

/// Type tag used in place of unknown types under [`UnknownTypePolicy::Substitute`]
pub const SUBSTITUTE_TYPE: &str = "Node";

/// What to do with a serialized node whose type tag is not registered
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownTypePolicy {
    /// Abort the whole load
    Fail,
    /// Drop the node and its subtree, keep loading siblings
    #[default]
    Skip,
    /// Build a plain base node instead and keep its children
    Substitute,
}

/// Deserialization settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeserializeOptions {
    pub unknown_types: UnknownTypePolicy,
}

impl DeserializeOptions {
    pub fn with_policy(unknown_types: UnknownTypePolicy) -> Self {
        Self { unknown_types }
    }
}

/// Recoverable problems encountered during a load
#[derive(Debug, Default)]
pub struct DeserializeReport {
    /// Property-level failures; the affected property kept its default
    pub property_errors: Vec<SceneError>,
    /// Subtrees that were dropped, with the reason
    pub skipped: Vec<SceneError>,
    /// Ids of nodes built as [`SUBSTITUTE_TYPE`] in place of an unknown type
    pub substituted: Vec<NodeId>,
}

impl DeserializeReport {
    /// Whether the load completed without any recorded problem
    pub fn is_clean(&self) -> bool {
        self.property_errors.is_empty() && self.skipped.is_empty() && self.substituted.is_empty()
    }

    pub fn warning_count(&self) -> usize {
        self.property_errors.len() + self.skipped.len() + self.substituted.len()
    }
}

/// A freshly built tree plus the work still pending on it
#[derive(Debug)]
pub struct DeserializedScene {
    pub tree: SceneTree,
    /// Activations in walk order, to run once the tree is live
    pub activations: Vec<PendingActivation>,
    pub report: DeserializeReport,
}

/// Result of grafting a serialized subtree into an existing tree
#[derive(Debug)]
pub struct GraftedSubtree {
    pub root: NodeId,
    pub activations: Vec<PendingActivation>,
    pub report: DeserializeReport,
}

/// Per-load mutable state
#[derive(Default)]
struct LoadState {
    seen: HashSet<NodeId>,
    activations: Vec<PendingActivation>,
    report: DeserializeReport,
}

/// Converts between [`SceneTree`]s and [`SerializedNode`]s
#[derive(Clone, Debug)]
pub struct SceneSerializer {
    context: Arc<ReflectionContext>,
}

impl SceneSerializer {
    pub fn new(context: Arc<ReflectionContext>) -> Self {
        Self { context }
    }

    #[inline]
    pub fn context(&self) -> &Arc<ReflectionContext> {
        &self.context
    }

    // ------------------------------------------------------------------
    // Serialization
    // ------------------------------------------------------------------

    /// Serialize the subtree rooted at `id`. The tree is only read.
    pub fn serialize(&self, tree: &SceneTree, id: &NodeId) -> Result<SerializedNode> {
        let node = tree.node(id)?;
        let mut serialized = self.serialize_node(node);
        for child in node.children() {
            serialized.children.push(self.serialize(tree, child)?);
        }
        Ok(serialized)
    }

    pub fn serialize_tree(&self, tree: &SceneTree) -> Result<SerializedNode> {
        self.serialize(tree, tree.root_id())
    }

    /// Serialize the whole tree into a document at the current format version
    pub fn document(&self, tree: &SceneTree, name: impl Into<String>) -> Result<SceneDocument> {
        Ok(SceneDocument::new(name, self.serialize_tree(tree)?))
    }

    /// A node's own data, without children
    fn serialize_node(&self, node: &Node) -> SerializedNode {
        let mut serialized = SerializedNode::new(node.type_tag(), node.name(), node.id().clone());

        for (name, descriptor) in self.context.registry().resolve(node.type_tag()) {
            if !descriptor.is_serializable() {
                continue;
            }
            let Some(value) = descriptor.read(node) else {
                continue;
            };
            if ValueCodec::is_default(&value, &descriptor) {
                continue;
            }
            match ValueCodec::encode(&value, descriptor.ty()) {
                Ok(plain) => {
                    serialized.properties.insert(name, plain);
                }
                Err(e) => {
                    log::warn!(
                        "Property '{}' on {} ({}) not serialized: {}",
                        name,
                        node.id(),
                        node.type_tag(),
                        e
                    );
                }
            }
        }

        serialized
    }

    // ------------------------------------------------------------------
    // Deserialization
    // ------------------------------------------------------------------

    /// Build a new tree from a serialized root.
    ///
    /// An unknown root type is an error unless the policy substitutes it.
    pub fn deserialize(
        &self,
        serialized: &SerializedNode,
        options: DeserializeOptions,
    ) -> Result<DeserializedScene> {
        let mut state = LoadState::default();

        let root = match self.build_node(serialized, &mut state) {
            Ok(node) => node,
            Err(e @ SceneError::UnknownType { .. })
                if options.unknown_types == UnknownTypePolicy::Substitute =>
            {
                log::warn!("{}; substituting {}", e, SUBSTITUTE_TYPE);
                self.build_substitute(serialized, &mut state)
            }
            Err(e) => return Err(e),
        };
        state.seen.insert(root.id().clone());
        self.collect_activation(&root, &mut state);

        let mut tree = SceneTree::new(root);
        let root_id = tree.root_id().clone();
        self.attach_children(&mut tree, &root_id, &serialized.children, options, &mut state)?;

        log::debug!(
            "Deserialized '{}': {} nodes, {} activations, {} warnings",
            serialized.name,
            tree.len(),
            state.activations.len(),
            state.report.warning_count()
        );

        Ok(DeserializedScene {
            tree,
            activations: state.activations,
            report: state.report,
        })
    }

    /// Check the document's version, then build a tree from its root
    pub fn deserialize_document(
        &self,
        document: &SceneDocument,
        options: DeserializeOptions,
    ) -> Result<DeserializedScene> {
        document.check_version()?;
        self.deserialize(&document.root, options)
    }

    /// Graft a serialized subtree under `parent` at `index`.
    ///
    /// Ids are kept as stored. The subtree root must not collide with a
    /// node already in the tree; nested collisions are skipped and reported.
    pub fn deserialize_into(
        &self,
        tree: &mut SceneTree,
        parent: &NodeId,
        index: usize,
        serialized: &SerializedNode,
        options: DeserializeOptions,
    ) -> Result<GraftedSubtree> {
        tree.node(parent)?;
        if tree.contains(&serialized.id) {
            return Err(SceneError::DuplicateId(serialized.id.clone()));
        }

        let mut state = LoadState::default();
        let node = match self.build_node(serialized, &mut state) {
            Ok(node) => node,
            Err(e @ SceneError::UnknownType { .. })
                if options.unknown_types == UnknownTypePolicy::Substitute =>
            {
                log::warn!("{}; substituting {}", e, SUBSTITUTE_TYPE);
                self.build_substitute(serialized, &mut state)
            }
            Err(e) => return Err(e),
        };
        state.seen.insert(node.id().clone());
        self.collect_activation(&node, &mut state);

        let root = tree.insert_child(parent, index, node)?;
        if let Err(e) = self.attach_children(tree, &root, &serialized.children, options, &mut state) {
            // Leave the tree as it was
            if let Err(rollback) = tree.remove(&root) {
                log::error!("Rollback of grafted subtree {} failed: {}", root, rollback);
            }
            return Err(e);
        }

        Ok(GraftedSubtree {
            root,
            activations: state.activations,
            report: state.report,
        })
    }

    fn attach_children(
        &self,
        tree: &mut SceneTree,
        parent: &NodeId,
        children: &[SerializedNode],
        options: DeserializeOptions,
        state: &mut LoadState,
    ) -> Result<()> {
        for child in children {
            if state.seen.contains(&child.id) || tree.contains(&child.id) {
                log::warn!("Duplicate node id {} in document; subtree skipped", child.id);
                state.report.skipped.push(SceneError::DuplicateId(child.id.clone()));
                continue;
            }

            let node = match self.build_node(child, state) {
                Ok(node) => node,
                Err(e @ SceneError::UnknownType { .. }) => match options.unknown_types {
                    UnknownTypePolicy::Fail => return Err(e),
                    UnknownTypePolicy::Skip => {
                        log::warn!("{}; subtree skipped", e);
                        state.report.skipped.push(e);
                        continue;
                    }
                    UnknownTypePolicy::Substitute => {
                        log::warn!("{}; substituting {}", e, SUBSTITUTE_TYPE);
                        self.build_substitute(child, state)
                    }
                },
                Err(e) => return Err(e),
            };

            state.seen.insert(node.id().clone());
            self.collect_activation(&node, state);
            let id = tree.add_child(parent, node)?;
            self.attach_children(tree, &id, &child.children, options, state)?;
        }
        Ok(())
    }

    /// Construct a node of the stored type and assign its properties
    fn build_node(&self, serialized: &SerializedNode, state: &mut LoadState) -> Result<Node> {
        let constructor = self
            .context
            .directory()
            .lookup(&serialized.type_tag)
            .ok_or_else(|| SceneError::UnknownType {
                tag: serialized.type_tag.clone(),
                node_id: serialized.id.to_string(),
            })?;

        let mut node = constructor(&serialized.name);
        node.set_name(serialized.name.as_str());
        node.set_id(serialized.id.clone());
        self.context.seed_defaults(&mut node);
        self.assign_properties(&mut node, serialized, state);
        Ok(node)
    }

    fn build_substitute(&self, serialized: &SerializedNode, state: &mut LoadState) -> Node {
        let mut node = match self.context.instantiate(SUBSTITUTE_TYPE, &serialized.name) {
            Ok(node) => node,
            Err(_) => Node::new(SUBSTITUTE_TYPE, serialized.name.as_str()),
        };
        node.set_id(serialized.id.clone());
        self.assign_properties(&mut node, serialized, state);
        state.report.substituted.push(serialized.id.clone());
        node
    }

    fn assign_properties(&self, node: &mut Node, serialized: &SerializedNode, state: &mut LoadState) {
        let registry = self.context.registry();
        let tag = node.type_tag().to_string();
        for (name, plain) in &serialized.properties {
            let outcome = match registry.describe(&tag, name) {
                None => Err(format!("type '{}' has no such property", tag)),
                Some(descriptor) => ValueCodec::decode(plain, descriptor.ty())
                    .map_err(|e| e.to_string())
                    .and_then(|value| descriptor.write(node, value)),
            };

            if let Err(message) = outcome {
                log::warn!(
                    "Property '{}' on {} ({}) kept its default: {}",
                    name,
                    node.id(),
                    tag,
                    message
                );
                state.report.property_errors.push(SceneError::PropertyAssignment {
                    node_id: node.id().clone(),
                    property: name.clone(),
                    message,
                });
            }
        }
    }

    fn collect_activation(&self, node: &Node, state: &mut LoadState) {
        if let Some(kind) = self.context.directory().activation_for(node) {
            state.activations.push(PendingActivation {
                node: node.id().clone(),
                kind,
            });
        }
    }

    // ------------------------------------------------------------------
    // Utilities
    // ------------------------------------------------------------------

    /// Copy a serialized subtree, giving every node a fresh id
    pub fn regenerate_ids(serialized: &SerializedNode) -> SerializedNode {
        SerializedNode {
            type_tag: serialized.type_tag.clone(),
            name: serialized.name.clone(),
            id: NodeId::generate(),
            properties: serialized.properties.clone(),
            children: serialized.children.iter().map(Self::regenerate_ids).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyDescriptor;
    use crate::value::{PropertyType, PropertyValue};
    use serde_json::json;

    fn context() -> Arc<ReflectionContext> {
        let mut ctx = ReflectionContext::new();
        ctx.define_type("Node", None, []);
        ctx.define_type(
            "Item",
            Some("Node"),
            [
                PropertyDescriptor::new("count", PropertyType::Number).with_default(1.0),
                PropertyDescriptor::new("cache", PropertyType::String).transient(),
            ],
        );
        Arc::new(ctx)
    }

    #[test]
    fn test_transient_properties_are_not_written() {
        let serializer = SceneSerializer::new(context());
        let mut root = serializer.context().instantiate("Item", "root").unwrap();
        root.set_field("cache", PropertyValue::String("scratch".into()));
        root.set_field("count", PropertyValue::Number(3.0));
        let tree = SceneTree::new(root);

        let serialized = serializer.serialize_tree(&tree).unwrap();
        assert_eq!(serialized.properties.len(), 1);
        assert_eq!(serialized.properties["count"], json!(3.0));
    }

    #[test]
    fn test_unknown_property_is_reported() {
        let serializer = SceneSerializer::new(context());
        let serialized = SerializedNode::new("Item", "root", "r".into())
            .with_property("bogus", json!(1))
            .with_property("count", json!(4));

        let scene = serializer.deserialize(&serialized, DeserializeOptions::default()).unwrap();
        assert_eq!(scene.report.property_errors.len(), 1);
        assert!(scene.report.property_errors[0].is_property_level());
        let root = scene.tree.root();
        assert_eq!(root.field("count"), Some(&PropertyValue::Number(4.0)));
    }

    #[test]
    fn test_duplicate_ids_skip_subtree() {
        let serializer = SceneSerializer::new(context());
        let serialized = SerializedNode::new("Node", "root", "r".into())
            .with_child(SerializedNode::new("Item", "a", "dup".into()))
            .with_child(
                SerializedNode::new("Item", "b", "dup".into())
                    .with_child(SerializedNode::new("Item", "c", "c".into())),
            );

        let scene = serializer.deserialize(&serialized, DeserializeOptions::default()).unwrap();
        assert_eq!(scene.tree.len(), 2);
        assert!(matches!(scene.report.skipped[0], SceneError::DuplicateId(_)));
    }

    #[test]
    fn test_regenerate_ids() {
        let serialized = SerializedNode::new("Node", "root", "r".into())
            .with_child(SerializedNode::new("Item", "a", "a".into()));
        let copy = SceneSerializer::regenerate_ids(&serialized);
        assert_ne!(copy.id, serialized.id);
        assert_ne!(copy.children[0].id, serialized.children[0].id);
        assert_eq!(copy.children[0].name, "a");
    }

    #[test]
    fn test_graft_keeps_ids_and_position() {
        let serializer = SceneSerializer::new(context());
        let root = SerializedNode::new("Node", "root", "r".into())
            .with_child(SerializedNode::new("Item", "a", "a".into()))
            .with_child(SerializedNode::new("Item", "b", "b".into()));
        let mut scene = serializer.deserialize(&root, DeserializeOptions::default()).unwrap();

        let branch = SerializedNode::new("Item", "x", "x".into())
            .with_child(SerializedNode::new("Item", "y", "y".into()));
        let parent = scene.tree.root_id().clone();
        let grafted = serializer
            .deserialize_into(&mut scene.tree, &parent, 1, &branch, DeserializeOptions::default())
            .unwrap();

        assert_eq!(grafted.root, NodeId::from("x"));
        let order: Vec<&str> = scene.tree.children_of(&parent).iter().map(NodeId::as_str).collect();
        assert_eq!(order, vec!["a", "x", "b"]);
        assert_eq!(scene.tree.parent_of(&"y".into()), Some(&NodeId::from("x")));

        let again = serializer.deserialize_into(&mut scene.tree, &parent, 0, &branch, DeserializeOptions::default());
        assert!(matches!(again, Err(SceneError::DuplicateId(_))));
    }

    #[test]
    fn test_failed_graft_leaves_tree_unchanged() {
        let serializer = SceneSerializer::new(context());
        let root = SerializedNode::new("Node", "root", "r".into())
            .with_child(SerializedNode::new("Item", "a", "a".into()));
        let mut scene = serializer.deserialize(&root, DeserializeOptions::default()).unwrap();
        let before = serializer.serialize_tree(&scene.tree).unwrap();

        let branch = SerializedNode::new("Item", "x", "x".into())
            .with_child(SerializedNode::new("Item", "y", "y".into()))
            .with_child(SerializedNode::new("Missing", "z", "z".into()));
        let parent = scene.tree.root_id().clone();
        let result = serializer.deserialize_into(
            &mut scene.tree,
            &parent,
            0,
            &branch,
            DeserializeOptions::with_policy(UnknownTypePolicy::Fail),
        );

        assert!(matches!(result, Err(SceneError::UnknownType { .. })));
        assert!(!scene.tree.contains(&"x".into()));
        assert!(!scene.tree.contains(&"y".into()));
        assert_eq!(serializer.serialize_tree(&scene.tree).unwrap(), before);
    }
}
