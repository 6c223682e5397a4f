//! Built-in node types
//!
//! | type             | parent   | properties                                   |
//! |------------------|----------|----------------------------------------------|
//! | `Node`           |          |                                              |
//! | `Scene`          | `Node`   | `ambient_color`                              |
//! | `Node3D`         | `Node`   | `position`, `rotation`, `scale`, `visible`   |
//! | `Camera3D`       | `Node3D` | `fov`, `near`, `far`, `current`              |
//! | `MeshInstance3D` | `Node3D` | `mesh` (asset), `color`, `cast_shadows`      |
//! | `Light3D`        | `Node3D` | `color`, `intensity`, `range`                |

use crate::context::ReflectionContext;
use crate::math::{Color, Vec3};
use crate::node::Node;
use crate::property::PropertyDescriptor;
use crate::types::ActivationKind;
use crate::value::{PropertyType, PropertyValue};

pub const NODE: &str = "Node";
pub const SCENE: &str = "Scene";
pub const NODE_3D: &str = "Node3D";
pub const CAMERA_3D: &str = "Camera3D";
pub const MESH_INSTANCE_3D: &str = "MeshInstance3D";
pub const LIGHT_3D: &str = "Light3D";

const DEFAULT_AMBIENT: Color = Color::rgb(0.1, 0.1, 0.12);

/// Register every built-in type on `ctx`
pub fn install(ctx: &mut ReflectionContext) {
    ctx.define_type(NODE, None, []);

    ctx.define_type(
        SCENE,
        Some(NODE),
        [PropertyDescriptor::new("ambient_color", PropertyType::Color).with_default(DEFAULT_AMBIENT)],
    );

    ctx.define_type(
        NODE_3D,
        Some(NODE),
        [
            PropertyDescriptor::new("position", PropertyType::Vector3).with_default(Vec3::ZERO),
            PropertyDescriptor::new("rotation", PropertyType::Vector3).with_default(Vec3::ZERO),
            PropertyDescriptor::new("scale", PropertyType::Vector3).with_default(Vec3::ONE),
            PropertyDescriptor::new("visible", PropertyType::Boolean).with_default(true),
        ],
    );

    ctx.define_type(
        CAMERA_3D,
        Some(NODE_3D),
        [
            PropertyDescriptor::new("fov", PropertyType::Number)
                .with_default(70.0)
                .with_setter(|node, value| {
                    let fov = value.as_number().unwrap_or(f64::NAN);
                    if !(fov > 0.0 && fov < 180.0) {
                        return Err(format!("field of view {} outside (0, 180)", fov));
                    }
                    node.set_field("fov", value);
                    Ok(())
                }),
            PropertyDescriptor::new("near", PropertyType::Number).with_default(0.1),
            PropertyDescriptor::new("far", PropertyType::Number).with_default(1000.0),
            PropertyDescriptor::new("current", PropertyType::Boolean).with_default(false),
        ],
    );
    ctx.directory_mut().register_activation(CAMERA_3D, |node| {
        is_current_camera(node).then_some(ActivationKind::CurrentCamera)
    });

    ctx.define_type(
        MESH_INSTANCE_3D,
        Some(NODE_3D),
        [
            PropertyDescriptor::new("mesh", PropertyType::String)
                .with_default("")
                .asset(),
            PropertyDescriptor::new("color", PropertyType::Color).with_default(Color::WHITE),
            PropertyDescriptor::new("cast_shadows", PropertyType::Boolean).with_default(true),
        ],
    );

    ctx.define_type(
        LIGHT_3D,
        Some(NODE_3D),
        [
            PropertyDescriptor::new("color", PropertyType::Color).with_default(Color::WHITE),
            PropertyDescriptor::new("intensity", PropertyType::Number)
                .with_default(1.0)
                .with_setter(|node, value| {
                    let intensity = value.as_number().unwrap_or(f64::NAN);
                    if intensity.is_nan() || intensity < 0.0 {
                        return Err(format!("intensity {} must be non-negative", intensity));
                    }
                    node.set_field("intensity", value);
                    Ok(())
                }),
            PropertyDescriptor::new("range", PropertyType::Number).with_default(10.0),
        ],
    );

    log::debug!("Installed {} built-in node types", ctx.directory().tags().len());
}

/// Whether a node is a camera flagged as the current one
pub fn is_current_camera(node: &Node) -> bool {
    node.type_tag() == CAMERA_3D
        && matches!(node.field("current"), Some(PropertyValue::Boolean(true)))
}
