//! Live scene tree
//!
//! Nodes are stored in an arena keyed by [`NodeId`]. A parent owns its
//! children by containment: removing a node drops its entire subtree. The
//! parent link on each node is a plain id and never keeps anything alive.

use std::collections::HashMap;

use crate::error::{Result, SceneError};
use crate::node::{Node, NodeId};

/// A rooted tree of nodes
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
}

impl SceneTree {
    /// Create a tree holding only `root`
    pub fn new(root: Node) -> Self {
        let root = root.detached();
        let id = root.id().clone();
        let mut nodes = HashMap::new();
        nodes.insert(id.clone(), root);
        Self { nodes, root: id }
    }

    #[inline]
    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> &Node {
        // The root entry is inserted in `new` and can never be removed
        &self.nodes[&self.root]
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Like [`get`](Self::get), but reports a missing node as an error
    pub fn node(&self, id: &NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| SceneError::NodeNotFound(id.clone()))
    }

    pub fn node_mut(&mut self, id: &NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| SceneError::NodeNotFound(id.clone()))
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false; a tree has at least its root
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a detached node as the last child of `parent`
    pub fn add_child(&mut self, parent: &NodeId, node: Node) -> Result<NodeId> {
        self.insert_child(parent, usize::MAX, node)
    }

    /// Insert a detached node under `parent` at `index` (clamped to the
    /// child count)
    pub fn insert_child(&mut self, parent: &NodeId, index: usize, node: Node) -> Result<NodeId> {
        if self.nodes.contains_key(node.id()) {
            return Err(SceneError::DuplicateId(node.id().clone()));
        }
        let mut node = node.detached();
        let id = node.id().clone();
        node.set_parent(Some(parent.clone()));

        let parent_node = self.node_mut(parent)?;
        let children = parent_node.children_mut();
        let index = index.min(children.len());
        children.insert(index, id.clone());

        self.nodes.insert(id.clone(), node);
        Ok(id)
    }

    /// Move `id` under `new_parent`. The node is taken out of its old
    /// parent's child list before being inserted, so it is never listed twice.
    pub fn reparent(&mut self, id: &NodeId, new_parent: &NodeId, index: Option<usize>) -> Result<()> {
        if *id == self.root {
            return Err(SceneError::RootOperation("reparent"));
        }
        self.node(id)?;
        self.node(new_parent)?;
        if id == new_parent || self.is_ancestor(id, new_parent) {
            return Err(SceneError::HierarchyCycle {
                node: id.clone(),
                new_parent: new_parent.clone(),
            });
        }

        self.unlink(id);

        let parent_node = self.node_mut(new_parent)?;
        let children = parent_node.children_mut();
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, id.clone());

        self.node_mut(id)?.set_parent(Some(new_parent.clone()));
        Ok(())
    }

    /// Remove a node and its whole subtree. Returns the removed nodes in
    /// pre-order, the requested node first.
    pub fn remove(&mut self, id: &NodeId) -> Result<Vec<Node>> {
        if *id == self.root {
            return Err(SceneError::RootOperation("remove"));
        }
        let order = self.walk(id)?;
        self.unlink(id);

        let mut removed = Vec::with_capacity(order.len());
        for node_id in order {
            if let Some(node) = self.nodes.remove(&node_id) {
                removed.push(node);
            }
        }
        Ok(removed)
    }

    pub fn parent_of(&self, id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(id).and_then(Node::parent)
    }

    pub fn children_of(&self, id: &NodeId) -> &[NodeId] {
        self.nodes.get(id).map(Node::children).unwrap_or(&[])
    }

    /// Position of `id` within its parent's child list
    pub fn index_in_parent(&self, id: &NodeId) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent).iter().position(|c| c == id)
    }

    /// Ancestors of `id`, nearest first
    pub fn ancestors(&self, id: &NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut current = self.parent_of(id);
        while let Some(parent) = current {
            if chain.contains(parent) {
                break;
            }
            chain.push(parent.clone());
            current = self.parent_of(parent);
        }
        chain
    }

    /// Whether `ancestor` lies on the parent chain of `id`
    pub fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        self.ancestors(id).iter().any(|a| a == ancestor)
    }

    /// Pre-order walk of the subtree rooted at `id`, `id` first
    pub fn walk(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut order = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(current) = stack.pop() {
            let children = self.children_of(&current);
            stack.extend(children.iter().rev().cloned());
            order.push(current);
        }
        Ok(order)
    }

    /// All nodes below `id`, in pre-order
    pub fn descendants(&self, id: &NodeId) -> Vec<NodeId> {
        self.walk(id)
            .map(|mut order| {
                order.remove(0);
                order
            })
            .unwrap_or_default()
    }

    /// First node with the given name, in pre-order from the root
    pub fn find_by_name(&self, name: &str) -> Option<&Node> {
        self.walk(&self.root)
            .ok()?
            .into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .find(|node| node.name() == name)
    }

    /// Unordered iteration over every node
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Detach `id` from its parent's child list and clear its parent link
    fn unlink(&mut self, id: &NodeId) {
        let parent = self.parent_of(id).cloned();
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent) {
                parent_node.children_mut().retain(|c| c != id);
            }
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.set_parent(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SceneTree, NodeId, NodeId, NodeId) {
        let mut tree = SceneTree::new(Node::with_id("root".into(), "Scene", "Root"));
        let root = tree.root_id().clone();
        let a = tree.add_child(&root, Node::with_id("a".into(), "Node3D", "A")).unwrap();
        let b = tree.add_child(&root, Node::with_id("b".into(), "Node3D", "B")).unwrap();
        let c = tree.add_child(&a, Node::with_id("c".into(), "Node3D", "C")).unwrap();
        (tree, a, b, c)
    }

    #[test]
    fn test_add_and_walk() {
        let (tree, a, b, c) = sample();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children_of(tree.root_id()), &[a.clone(), b.clone()]);
        assert_eq!(tree.parent_of(&c), Some(&a));

        let order = tree.walk(tree.root_id()).unwrap();
        let names: Vec<&str> = order.iter().map(|id| tree.get(id).unwrap().name()).collect();
        assert_eq!(names, vec!["Root", "A", "C", "B"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let (mut tree, a, _, _) = sample();
        let err = tree.add_child(&a, Node::with_id("b".into(), "Node", "dup")).unwrap_err();
        assert!(matches!(err, SceneError::DuplicateId(_)));
    }

    #[test]
    fn test_reparent_is_a_move() {
        let (mut tree, a, b, c) = sample();
        tree.reparent(&c, &b, None).unwrap();
        assert!(tree.children_of(&a).is_empty());
        assert_eq!(tree.children_of(&b), &[c.clone()]);
        assert_eq!(tree.parent_of(&c), Some(&b));
    }

    #[test]
    fn test_reparent_cycle_rejected() {
        let (mut tree, a, _, c) = sample();
        let err = tree.reparent(&a, &c, None).unwrap_err();
        assert!(matches!(err, SceneError::HierarchyCycle { .. }));
        assert!(matches!(tree.reparent(&a, &a, None), Err(SceneError::HierarchyCycle { .. })));
        assert_eq!(tree.parent_of(&c), Some(&a));
    }

    #[test]
    fn test_remove_drops_subtree() {
        let (mut tree, a, b, c) = sample();
        let removed = tree.remove(&a).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].id(), &a);
        assert!(!tree.contains(&c));
        assert_eq!(tree.children_of(tree.root_id()), &[b]);

        let root = tree.root_id().clone();
        assert!(matches!(tree.remove(&root), Err(SceneError::RootOperation(_))));
    }

    #[test]
    fn test_insert_at_index() {
        let (mut tree, a, b, _) = sample();
        let root = tree.root_id().clone();
        let d = tree.insert_child(&root, 1, Node::new("Node", "D")).unwrap();
        assert_eq!(tree.children_of(&root), &[a, d.clone(), b]);
        assert_eq!(tree.index_in_parent(&d), Some(1));
        assert_eq!(tree.find_by_name("D").map(|n| n.id().clone()), Some(d));
    }
}
