//! Plain value types carried by node properties.
//!
//! Components are `f64` so they survive a trip through JSON numbers
//! without rounding.

use serde::{Deserialize, Serialize};

/// 3D vector, persisted as `{x, y, z}`
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec3Repr")]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0] as f64, v[1] as f64, v[2] as f64)
    }
}

/// Accepted on-disk shapes for a vector: the canonical object or a bare array
#[derive(Deserialize)]
#[serde(untagged)]
enum Vec3Repr {
    Object { x: f64, y: f64, z: f64 },
    Array([f64; 3]),
}

impl From<Vec3Repr> for Vec3 {
    fn from(repr: Vec3Repr) -> Self {
        match repr {
            Vec3Repr::Object { x, y, z } => Vec3::new(x, y, z),
            Vec3Repr::Array(arr) => Vec3::from(arr),
        }
    }
}

/// Linear RGBA color, persisted as `{r, g, b, a}`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "ColorRepr")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite() && self.a.is_finite()
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn opaque() -> f64 {
    1.0
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ColorRepr {
    Object {
        r: f64,
        g: f64,
        b: f64,
        #[serde(default = "opaque")]
        a: f64,
    },
    Rgba([f64; 4]),
    Rgb([f64; 3]),
}

impl From<ColorRepr> for Color {
    fn from(repr: ColorRepr) -> Self {
        match repr {
            ColorRepr::Object { r, g, b, a } => Color::rgba(r, g, b, a),
            ColorRepr::Rgba([r, g, b, a]) => Color::rgba(r, g, b, a),
            ColorRepr::Rgb([r, g, b]) => Color::rgb(r, g, b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vec3_accepts_object_and_array() {
        let a: Vec3 = serde_json::from_value(json!({"x": 1, "y": 2.5, "z": -3})).unwrap();
        let b: Vec3 = serde_json::from_value(json!([1.0, 2.5, -3.0])).unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_value(a).unwrap(), json!({"x": 1.0, "y": 2.5, "z": -3.0}));
    }

    #[test]
    fn test_color_alpha_defaults_to_one() {
        let c: Color = serde_json::from_value(json!({"r": 0.5, "g": 0.25, "b": 0.0})).unwrap();
        assert_eq!(c, Color::rgb(0.5, 0.25, 0.0));

        let short: Color = serde_json::from_value(json!([1.0, 0.0, 0.0])).unwrap();
        assert_eq!(short.a, 1.0);
    }

    #[test]
    fn test_vec3_rejects_missing_component() {
        assert!(serde_json::from_value::<Vec3>(json!({"x": 1, "y": 2})).is_err());
    }
}
