//! Serialized scene documents
//!
//! A document is plain data: a format version, some metadata and a tree of
//! [`SerializedNode`]s. It holds no references into a live scene, so it can
//! be cloned, stored in snapshots and written to disk freely.
//!
//! ```json
//! {
//!   "version": "1.0.0",
//!   "metadata": { "name": "Level", "created": 1700000000000, "modified": 1700000000000 },
//!   "root": { "type": "Scene", "name": "Level", "id": "...", "properties": {}, "children": [] }
//! }
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use void_core::{Timestamp, Version};

use crate::error::{Result, SceneError};
use crate::node::NodeId;
use crate::value::PlainValue;

/// Document format written by this crate
pub const FORMAT_VERSION: Version = Version::new(1, 0, 0);

/// One node in a serialized tree
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    #[serde(rename = "type")]
    pub type_tag: String,
    pub name: String,
    pub id: NodeId,
    /// Non-default serializable properties, in resolution order
    #[serde(default)]
    pub properties: IndexMap<String, PlainValue>,
    #[serde(default)]
    pub children: Vec<SerializedNode>,
}

impl SerializedNode {
    pub fn new(type_tag: impl Into<String>, name: impl Into<String>, id: NodeId) -> Self {
        Self {
            type_tag: type_tag.into(),
            name: name.into(),
            id,
            properties: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style property insertion
    pub fn with_property(mut self, name: impl Into<String>, value: PlainValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_child(mut self, child: SerializedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Nodes in this subtree, itself included
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(SerializedNode::node_count).sum::<usize>()
    }

    /// Depth-first search for a node by id
    pub fn find(&self, id: &NodeId) -> Option<&SerializedNode> {
        if self.id == *id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Ids in this subtree, pre-order
    pub fn ids(&self) -> Vec<&NodeId> {
        let mut ids = vec![&self.id];
        for child in &self.children {
            ids.extend(child.ids());
        }
        ids
    }
}

/// Descriptive metadata carried alongside the tree
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub name: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub modified: u64,
}

/// A complete, versioned scene document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    pub version: String,
    pub metadata: DocumentMetadata,
    pub root: SerializedNode,
}

impl SceneDocument {
    /// Wrap a serialized root at the current format version
    pub fn new(name: impl Into<String>, root: SerializedNode) -> Self {
        let now = Timestamp::now().as_millis();
        Self {
            version: FORMAT_VERSION.to_string(),
            metadata: DocumentMetadata {
                name: name.into(),
                created: now,
                modified: now,
            },
            root,
        }
    }

    /// Parse the version string and check this crate can read it
    pub fn check_version(&self) -> Result<Version> {
        let version = Version::parse(&self.version)
            .ok_or_else(|| SceneError::InvalidVersion(self.version.clone()))?;
        if !FORMAT_VERSION.can_read(&version) {
            return Err(SceneError::IncompatibleVersion {
                found: version.to_string(),
                supported: FORMAT_VERSION.to_string(),
            });
        }
        Ok(version)
    }

    /// Update the modification time
    pub fn touch(&mut self) {
        self.metadata.modified = Timestamp::now().as_millis();
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    pub fn find(&self, id: &NodeId) -> Option<&SerializedNode> {
        self.root.find(id)
    }

    /// Size of the compact JSON encoding
    pub fn byte_size(&self) -> usize {
        match serde_json::to_vec(self) {
            Ok(bytes) => bytes.len(),
            Err(e) => {
                log::warn!("Failed to measure document '{}': {}", self.metadata.name, e);
                0
            }
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_vec(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse a document and check its version
    pub fn from_json(json: &str) -> Result<Self> {
        let document: Self = serde_json::from_str(json)?;
        document.check_version()?;
        Ok(document)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let document: Self = serde_json::from_slice(bytes)?;
        document.check_version()?;
        Ok(document)
    }

    /// Read a document from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let document = Self::from_slice(&bytes)?;
        log::info!(
            "Loaded scene '{}' ({} nodes) from {}",
            document.metadata.name,
            document.node_count(),
            path.display()
        );
        Ok(document)
    }

    /// Write a document to disk
    pub fn save(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let path = path.as_ref();
        let text = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        std::fs::write(path, text)?;
        log::info!("Saved scene '{}' to {}", self.metadata.name, path.display());
        Ok(())
    }
}
