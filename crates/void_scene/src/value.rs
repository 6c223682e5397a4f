//! Typed property values and the codec to and from plain data
//!
//! Plain data is `serde_json::Value`: documents are JSON-shaped, so the
//! codec's output can be embedded in a [`crate::SerializedNode`] as-is.
//!
//! ## Default detection
//!
//! [`ValueCodec::is_default`] compares with exact equality. A property
//! authored at exactly its default (`position = {0,0,0}`) cannot be told
//! apart from one never touched, and is omitted from documents.

use core::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::math::{Color, Vec3};
use crate::property::PropertyDescriptor;

/// Plain, JSON-shaped data as stored in documents
pub type PlainValue = serde_json::Value;

/// The declared type of a property
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Number,
    Boolean,
    Vector3,
    Color,
    Object,
}

impl PropertyType {
    pub fn name(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Number => "number",
            PropertyType::Boolean => "boolean",
            PropertyType::Vector3 => "vector3",
            PropertyType::Color => "color",
            PropertyType::Object => "object",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed property value held by a live node
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Vector3(Vec3),
    Color(Color),
    /// Nested structured data, kept in its serialized form
    Object(PlainValue),
}

impl PropertyValue {
    /// The property type this value inhabits
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::String(_) => PropertyType::String,
            PropertyValue::Number(_) => PropertyType::Number,
            PropertyValue::Boolean(_) => PropertyType::Boolean,
            PropertyValue::Vector3(_) => PropertyType::Vector3,
            PropertyValue::Color(_) => PropertyType::Color,
            PropertyValue::Object(_) => PropertyType::Object,
        }
    }

    /// Build an object value through the value's own `Serialize` impl
    pub fn object<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        serde_json::to_value(value)
            .map(PropertyValue::Object)
            .map_err(|e| CodecError::Malformed {
                ty: PropertyType::Object,
                message: e.to_string(),
            })
    }

    /// Read an object value back through the target's `Deserialize` impl
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T, CodecError> {
        match self {
            PropertyValue::Object(plain) => {
                serde_json::from_value(plain.clone()).map_err(|e| CodecError::Malformed {
                    ty: PropertyType::Object,
                    message: e.to_string(),
                })
            }
            other => Err(CodecError::TypeMismatch {
                expected: PropertyType::Object,
                found: other.property_type(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            PropertyValue::Vector3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            PropertyValue::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<f32> for PropertyValue {
    fn from(v: f32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<Vec3> for PropertyValue {
    fn from(v: Vec3) -> Self {
        Self::Vector3(v)
    }
}

impl From<Color> for PropertyValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

/// Converts typed values to and from plain data
pub struct ValueCodec;

impl ValueCodec {
    /// Encode a typed value as plain data.
    pub fn encode(value: &PropertyValue, ty: PropertyType) -> Result<PlainValue, CodecError> {
        if value.property_type() != ty {
            return Err(CodecError::TypeMismatch {
                expected: ty,
                found: value.property_type(),
            });
        }

        match value {
            PropertyValue::String(s) => Ok(PlainValue::String(s.clone())),
            PropertyValue::Boolean(b) => Ok(PlainValue::Bool(*b)),
            PropertyValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(PlainValue::Number)
                .ok_or(CodecError::NonFinite),
            PropertyValue::Vector3(v) => {
                if !v.is_finite() {
                    return Err(CodecError::NonFinite);
                }
                Self::to_plain(v, ty)
            }
            PropertyValue::Color(c) => {
                if !c.is_finite() {
                    return Err(CodecError::NonFinite);
                }
                Self::to_plain(c, ty)
            }
            PropertyValue::Object(plain) => Ok(plain.clone()),
        }
    }

    /// Decode plain data as a value of the declared type.
    pub fn decode(plain: &PlainValue, ty: PropertyType) -> Result<PropertyValue, CodecError> {
        match ty {
            PropertyType::String => plain
                .as_str()
                .map(|s| PropertyValue::String(s.to_string()))
                .ok_or_else(|| Self::malformed(ty, plain)),
            PropertyType::Number => plain
                .as_f64()
                .map(PropertyValue::Number)
                .ok_or_else(|| Self::malformed(ty, plain)),
            PropertyType::Boolean => plain
                .as_bool()
                .map(PropertyValue::Boolean)
                .ok_or_else(|| Self::malformed(ty, plain)),
            PropertyType::Vector3 => Self::from_plain::<Vec3>(plain, ty).map(PropertyValue::Vector3),
            PropertyType::Color => Self::from_plain::<Color>(plain, ty).map(PropertyValue::Color),
            PropertyType::Object => Ok(PropertyValue::Object(plain.clone())),
        }
    }

    /// Whether `value` equals the descriptor's default, or the type's zero
    /// value when no default is registered. Exact comparison.
    pub fn is_default(value: &PropertyValue, descriptor: &PropertyDescriptor) -> bool {
        match descriptor.default() {
            Some(default) => value == default,
            None => match value {
                PropertyValue::Object(plain) => Self::is_empty_object(plain),
                other => *other == Self::zero_value(descriptor.ty()),
            },
        }
    }

    /// Canonical zero value for a property type
    pub fn zero_value(ty: PropertyType) -> PropertyValue {
        match ty {
            PropertyType::String => PropertyValue::String(String::new()),
            PropertyType::Number => PropertyValue::Number(0.0),
            PropertyType::Boolean => PropertyValue::Boolean(false),
            PropertyType::Vector3 => PropertyValue::Vector3(Vec3::ZERO),
            PropertyType::Color => PropertyValue::Color(Color::BLACK),
            PropertyType::Object => PropertyValue::Object(PlainValue::Array(Vec::new())),
        }
    }

    fn is_empty_object(plain: &PlainValue) -> bool {
        match plain {
            PlainValue::Null => true,
            PlainValue::Array(items) => items.is_empty(),
            _ => false,
        }
    }

    fn to_plain<T: Serialize>(value: &T, ty: PropertyType) -> Result<PlainValue, CodecError> {
        serde_json::to_value(value).map_err(|e| CodecError::Malformed {
            ty,
            message: e.to_string(),
        })
    }

    fn from_plain<T: DeserializeOwned>(plain: &PlainValue, ty: PropertyType) -> Result<T, CodecError> {
        T::deserialize(plain).map_err(|e| CodecError::Malformed {
            ty,
            message: e.to_string(),
        })
    }

    fn malformed(ty: PropertyType, plain: &PlainValue) -> CodecError {
        CodecError::Malformed {
            ty,
            message: format!("unexpected value {}", plain),
        }
    }
}
