//! # Void Scene - Scene Tree, Reflection & Documents
//!
//! Live scenes are trees of typed nodes. Each node type registers the
//! properties it exposes; the serializer walks those registrations to turn
//! a tree into a flat, versioned document and back.
//!
//! ## Architecture
//!
//! ```text
//! SceneTree ──► SceneSerializer ──► SceneDocument ──► JSON
//!                 │        ▲
//!                 ▼        │
//!          ReflectionContext (PropertyRegistry + TypeDirectory)
//! ```
//!
//! ## Key Concepts
//!
//! - **PropertyRegistry**: per-type property descriptors with inheritance
//! - **ValueCodec**: typed values to and from plain JSON data
//! - **TypeDirectory**: type tag to constructor and activation probe
//! - **SceneSerializer**: tree to document and back, omitting defaults

pub mod builtin;
pub mod context;
pub mod document;
pub mod error;
pub mod math;
pub mod node;
pub mod property;
pub mod serializer;
pub mod tree;
pub mod types;
pub mod value;

pub use context::ReflectionContext;
pub use document::{DocumentMetadata, SceneDocument, SerializedNode, FORMAT_VERSION};
pub use error::{CodecError, Result, SceneError};
pub use math::{Color, Vec3};
pub use node::{Node, NodeId};
pub use property::{PropertyDescriptor, PropertyGetter, PropertyMap, PropertyRegistry, PropertySetter};
pub use serializer::{
    DeserializeOptions, DeserializeReport, DeserializedScene, GraftedSubtree, SceneSerializer,
    UnknownTypePolicy, SUBSTITUTE_TYPE,
};
pub use tree::SceneTree;
pub use types::{ActivationKind, ActivationProbe, NodeConstructor, PendingActivation, TypeDirectory};
pub use value::{PlainValue, PropertyType, PropertyValue, ValueCodec};
