//! Error types for the scene crate

use thiserror::Error;

use crate::node::NodeId;
use crate::value::PropertyType;

/// Failures converting between typed property values and plain data
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    /// The value's variant does not match the declared property type
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: PropertyType,
        found: PropertyType,
    },

    /// Plain data has the wrong shape for the declared property type
    #[error("malformed {ty} data: {message}")]
    Malformed { ty: PropertyType, message: String },

    /// NaN and infinities have no JSON representation
    #[error("non-finite number cannot be encoded")]
    NonFinite,
}

/// Scene graph, reflection and document errors
#[derive(Debug, Error)]
pub enum SceneError {
    /// A document named a type tag with no registered constructor
    #[error("unknown node type '{tag}' (node '{node_id}')")]
    UnknownType { tag: String, node_id: String },

    /// A property write was rejected by its setter or could not be decoded
    #[error("cannot assign property '{property}' on {node_id}: {message}")]
    PropertyAssignment {
        node_id: NodeId,
        property: String,
        message: String,
    },

    /// The property is not declared for the node's type
    #[error("type '{tag}' has no property '{property}'")]
    UnknownProperty { tag: String, property: String },

    /// No node with the given id is part of the tree
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// A node id occurred twice within one tree or document
    #[error("duplicate node id: {0}")]
    DuplicateId(NodeId),

    /// The requested move would make a node its own ancestor
    #[error("moving {node} under {new_parent} would create a cycle")]
    HierarchyCycle { node: NodeId, new_parent: NodeId },

    /// The root cannot be removed, reparented or given a sibling
    #[error("operation not permitted on the scene root: {0}")]
    RootOperation(&'static str),

    /// The document's version string is not a semantic version
    #[error("invalid document version '{0}'")]
    InvalidVersion(String),

    /// The document was written by an incompatible format version
    #[error("document version {found} cannot be read by format {supported}")]
    IncompatibleVersion { found: String, supported: String },

    /// Value conversion failed
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// JSON (de)serialization failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SceneError {
    /// Whether the error only affects a single property and was recovered
    pub fn is_property_level(&self) -> bool {
        matches!(
            self,
            SceneError::PropertyAssignment { .. } | SceneError::UnknownProperty { .. }
        )
    }
}

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;
