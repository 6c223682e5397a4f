//! Property descriptors and the per-type registry
//!
//! Each concrete node type registers the properties it exposes. A type's
//! effective set is the union of its own registrations and those of every
//! ancestor, with the most derived registration winning on a name clash.
//!
//! Accessors are closures stored in the descriptor. When a descriptor has
//! none, the value lives in the node's field map under the property name.

use core::fmt;
use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::node::Node;
use crate::value::{PropertyType, PropertyValue};

/// Reads a property from a node
pub type PropertyGetter = Arc<dyn Fn(&Node) -> Option<PropertyValue> + Send + Sync>;

/// Writes a property to a node; an `Err` rejects the value
pub type PropertySetter = Arc<dyn Fn(&mut Node, PropertyValue) -> Result<(), String> + Send + Sync>;

/// Ordered, name-keyed set of descriptors
pub type PropertyMap = IndexMap<String, PropertyDescriptor>;

/// Metadata for one reflectable property
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    ty: PropertyType,
    serializable: bool,
    default: Option<PropertyValue>,
    getter: Option<PropertyGetter>,
    setter: Option<PropertySetter>,
    asset: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, ty: PropertyType) -> Self {
        Self {
            name: name.into(),
            ty,
            serializable: true,
            default: None,
            getter: None,
            setter: None,
            asset: false,
        }
    }

    pub fn with_default(mut self, value: impl Into<PropertyValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Exclude the property from documents
    pub fn transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Mark a string property as an opaque path to an external resource
    pub fn asset(mut self) -> Self {
        self.asset = true;
        self
    }

    pub fn with_getter<F>(mut self, getter: F) -> Self
    where
        F: Fn(&Node) -> Option<PropertyValue> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(getter));
        self
    }

    pub fn with_setter<F>(mut self, setter: F) -> Self
    where
        F: Fn(&mut Node, PropertyValue) -> Result<(), String> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn ty(&self) -> PropertyType {
        self.ty
    }

    #[inline]
    pub fn is_serializable(&self) -> bool {
        self.serializable
    }

    #[inline]
    pub fn is_asset(&self) -> bool {
        self.asset
    }

    #[inline]
    pub fn default(&self) -> Option<&PropertyValue> {
        self.default.as_ref()
    }

    /// Whether reads bypass the node's field map
    pub fn has_getter(&self) -> bool {
        self.getter.is_some()
    }

    /// Whether writes bypass the node's field map
    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }

    /// Read the current value through the getter, or the field map
    pub fn read(&self, node: &Node) -> Option<PropertyValue> {
        match &self.getter {
            Some(getter) => getter(node),
            None => node.field(&self.name).cloned(),
        }
    }

    /// Write a value through the setter, or into the field map.
    ///
    /// Values of the wrong type are rejected before the setter runs.
    pub fn write(&self, node: &mut Node, value: PropertyValue) -> Result<(), String> {
        if value.property_type() != self.ty {
            return Err(format!(
                "expected {} value, found {}",
                self.ty,
                value.property_type()
            ));
        }
        match &self.setter {
            Some(setter) => setter(node, value),
            None => {
                node.set_field(self.name.clone(), value);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("serializable", &self.serializable)
            .field("default", &self.default)
            .field("getter", &self.getter.is_some())
            .field("setter", &self.setter.is_some())
            .field("asset", &self.asset)
            .finish()
    }
}

/// Per-type descriptor tables with single inheritance
#[derive(Default)]
pub struct PropertyRegistry {
    /// Type tag -> parent type tag
    parents: HashMap<String, Option<String>>,
    /// Type tag -> own registrations, in registration order
    own: HashMap<String, PropertyMap>,
}

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type and its parent. Re-declaring replaces the parent.
    pub fn declare_type(&mut self, tag: &str, parent: Option<&str>) -> &mut Self {
        if parent == Some(tag) {
            log::warn!("Type '{}' cannot inherit from itself; declared as a root type", tag);
            self.parents.insert(tag.to_string(), None);
        } else {
            self.parents
                .insert(tag.to_string(), parent.map(str::to_string));
        }
        self.own.entry(tag.to_string()).or_default();
        self
    }

    /// Add or overwrite a descriptor on a type
    pub fn register(&mut self, tag: &str, descriptor: PropertyDescriptor) -> &mut Self {
        if !self.parents.contains_key(tag) {
            self.parents.insert(tag.to_string(), None);
        }
        let table = self.own.entry(tag.to_string()).or_default();
        if table.contains_key(descriptor.name()) {
            log::debug!("Overwriting property '{}' on '{}'", descriptor.name(), tag);
        }
        table.insert(descriptor.name().to_string(), descriptor);
        self
    }

    /// Whether the type has been declared or had properties registered
    pub fn contains_type(&self, tag: &str) -> bool {
        self.parents.contains_key(tag)
    }

    pub fn parent_of(&self, tag: &str) -> Option<&str> {
        self.parents.get(tag).and_then(|p| p.as_deref())
    }

    /// The type followed by its ancestors, most derived first
    pub fn ancestors(&self, tag: &str) -> Vec<&str> {
        let mut chain: Vec<&str> = Vec::new();
        let mut current = self.parents.get_key_value(tag).map(|(k, _)| k.as_str());
        while let Some(t) = current {
            if chain.contains(&t) {
                log::warn!("Inheritance cycle detected at type '{}'", t);
                break;
            }
            chain.push(t);
            current = self.parent_of(t);
        }
        chain
    }

    /// Whether `tag` is `base` or derives from it
    pub fn is_subtype_of(&self, tag: &str, base: &str) -> bool {
        self.ancestors(tag).contains(&base)
    }

    /// The effective descriptor set, ordered base-first.
    ///
    /// Derived registrations replace the base descriptor in place, so a
    /// property keeps the position where its most base type introduced it.
    pub fn resolve(&self, tag: &str) -> PropertyMap {
        let mut resolved = PropertyMap::new();
        for t in self.ancestors(tag).into_iter().rev() {
            if let Some(table) = self.own.get(t) {
                for (name, descriptor) in table {
                    resolved.insert(name.clone(), descriptor.clone());
                }
            }
        }
        resolved
    }

    /// Look up the effective descriptor for one property
    pub fn describe(&self, tag: &str, name: &str) -> Option<&PropertyDescriptor> {
        self.ancestors(tag)
            .into_iter()
            .find_map(|t| self.own.get(t).and_then(|table| table.get(name)))
    }

    pub fn has_property(&self, tag: &str, name: &str) -> bool {
        self.describe(tag, name).is_some()
    }

    /// Declared type tags, in no particular order
    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.parents.keys().map(String::as_str)
    }
}

impl fmt::Debug for PropertyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyRegistry")
            .field("types", &self.parents.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    fn registry() -> PropertyRegistry {
        let mut reg = PropertyRegistry::new();
        reg.declare_type("Base", None);
        reg.declare_type("Derived", Some("Base"));
        reg.register("Base", PropertyDescriptor::new("a", PropertyType::Number))
            .register("Base", PropertyDescriptor::new("b", PropertyType::String))
            .register(
                "Derived",
                PropertyDescriptor::new("a", PropertyType::Number).with_default(5.0),
            )
            .register("Derived", PropertyDescriptor::new("c", PropertyType::Boolean));
        reg
    }

    #[test]
    fn test_resolve_inherits_base_first() {
        let reg = registry();
        let resolved = reg.resolve("Derived");
        let names: Vec<&str> = resolved.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(resolved["a"].default(), Some(&PropertyValue::Number(5.0)));

        let base = reg.resolve("Base");
        assert_eq!(base.len(), 2);
        assert_eq!(base["a"].default(), None);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut reg = registry();
        reg.register("Base", PropertyDescriptor::new("b", PropertyType::Number));
        reg.register("Base", PropertyDescriptor::new("b", PropertyType::Number));
        let resolved = reg.resolve("Base");
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved["b"].ty(), PropertyType::Number);
    }

    #[test]
    fn test_describe_and_subtypes() {
        let reg = registry();
        assert!(reg.has_property("Derived", "b"));
        assert!(!reg.has_property("Base", "c"));
        assert!(reg.is_subtype_of("Derived", "Base"));
        assert!(!reg.is_subtype_of("Base", "Derived"));
        assert_eq!(reg.ancestors("Derived"), vec!["Derived", "Base"]);
        assert!(reg.resolve("Missing").is_empty());
    }

    #[test]
    fn test_direct_field_access_and_type_check() {
        let descriptor = PropertyDescriptor::new("position", PropertyType::Vector3);
        let mut node = Node::new("Node3D", "n");

        assert_eq!(descriptor.read(&node), None);
        descriptor
            .write(&mut node, PropertyValue::Vector3(Vec3::new(1.0, 2.0, 3.0)))
            .unwrap();
        assert_eq!(descriptor.read(&node), Some(PropertyValue::Vector3(Vec3::new(1.0, 2.0, 3.0))));

        assert!(descriptor.write(&mut node, PropertyValue::Number(1.0)).is_err());
    }

    #[test]
    fn test_accessor_closures() {
        let descriptor = PropertyDescriptor::new("label", PropertyType::String)
            .with_getter(|node| Some(PropertyValue::String(node.name().to_uppercase())))
            .with_setter(|node, value| match value {
                PropertyValue::String(s) if !s.is_empty() => {
                    node.set_name(s.to_lowercase());
                    Ok(())
                }
                _ => Err("label must not be empty".to_string()),
            });
        let mut node = Node::new("Node", "hello");

        assert_eq!(descriptor.read(&node).unwrap().as_str(), Some("HELLO"));
        descriptor.write(&mut node, "WORLD".into()).unwrap();
        assert_eq!(node.name(), "world");
        assert!(descriptor.write(&mut node, "".into()).is_err());
        assert!(node.field("label").is_none());
    }
}
