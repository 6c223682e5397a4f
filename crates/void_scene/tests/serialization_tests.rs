//! Integration tests for scene serialization

use std::sync::Arc;

use serde_json::json;
use void_scene::builtin::{CAMERA_3D, LIGHT_3D, MESH_INSTANCE_3D, NODE_3D, SCENE};
use void_scene::*;

fn serializer() -> SceneSerializer {
    let _ = env_logger::builder().is_test(true).try_init();
    SceneSerializer::new(Arc::new(ReflectionContext::with_builtins()))
}

fn set(serializer: &SceneSerializer, tree: &mut SceneTree, id: &NodeId, name: &str, value: PropertyValue) {
    let node = tree.get_mut(id).unwrap();
    let descriptor = serializer
        .context()
        .registry()
        .describe(node.type_tag(), name)
        .unwrap()
        .clone();
    descriptor.write(node, value).unwrap();
}

fn sample_tree(serializer: &SceneSerializer) -> SceneTree {
    let ctx = serializer.context();
    let mut tree = SceneTree::new(ctx.instantiate(SCENE, "Level").unwrap());
    let root = tree.root_id().clone();

    let pivot = tree.add_child(&root, ctx.instantiate(NODE_3D, "Pivot").unwrap()).unwrap();
    let cube = tree
        .add_child(&pivot, ctx.instantiate(MESH_INSTANCE_3D, "Cube").unwrap())
        .unwrap();
    let camera = tree.add_child(&root, ctx.instantiate(CAMERA_3D, "Camera").unwrap()).unwrap();
    let light = tree.add_child(&root, ctx.instantiate(LIGHT_3D, "Sun").unwrap()).unwrap();

    set(serializer, &mut tree, &pivot, "position", Vec3::new(0.0, 2.0, 0.0).into());
    set(serializer, &mut tree, &cube, "mesh", "meshes/cube.glb".into());
    set(serializer, &mut tree, &cube, "color", Color::rgb(1.0, 0.0, 0.0).into());
    set(serializer, &mut tree, &camera, "current", true.into());
    set(serializer, &mut tree, &camera, "fov", 55.0.into());
    set(serializer, &mut tree, &light, "intensity", 3.5.into());
    tree
}

fn names_in_order(tree: &SceneTree) -> Vec<String> {
    tree.walk(tree.root_id())
        .unwrap()
        .iter()
        .map(|id| tree.get(id).unwrap().name().to_string())
        .collect()
}

#[test]
fn test_round_trip_preserves_structure_and_properties() {
    let serializer = serializer();
    let tree = sample_tree(&serializer);

    let document = serializer.document(&tree, "Level").unwrap();
    let json = document.to_json_pretty().unwrap();
    let parsed = SceneDocument::from_json(&json).unwrap();
    let scene = serializer
        .deserialize_document(&parsed, DeserializeOptions::default())
        .unwrap();

    assert!(scene.report.is_clean());
    assert_eq!(names_in_order(&scene.tree), names_in_order(&tree));
    for node in tree.iter() {
        let restored = scene.tree.get(node.id()).unwrap();
        assert_eq!(restored.type_tag(), node.type_tag());
        assert_eq!(restored.name(), node.name());
        for (name, descriptor) in serializer.context().properties(node.type_tag()) {
            assert_eq!(descriptor.read(restored), descriptor.read(node), "property {}", name);
        }
    }

    // Serializing the restored tree gives the same root
    assert_eq!(serializer.serialize_tree(&scene.tree).unwrap(), document.root);
}

#[test]
fn test_defaults_are_omitted() {
    let serializer = serializer();
    let ctx = serializer.context();
    let mut tree = SceneTree::new(ctx.instantiate(SCENE, "Empty").unwrap());
    let root = tree.root_id().clone();
    let node = tree.add_child(&root, ctx.instantiate(NODE_3D, "Plain").unwrap()).unwrap();

    // Explicitly authored at the default value is indistinguishable
    set(&serializer, &mut tree, &node, "scale", Vec3::ONE.into());

    let serialized = serializer.serialize_tree(&tree).unwrap();
    assert!(serialized.properties.is_empty());
    assert!(serialized.children[0].properties.is_empty());
}

#[test]
fn test_non_default_values_are_included() {
    let serializer = serializer();
    let tree = sample_tree(&serializer);
    let serialized = serializer.serialize_tree(&tree).unwrap();

    let pivot = &serialized.children[0];
    assert_eq!(pivot.properties.len(), 1);
    assert_eq!(pivot.properties["position"], json!({"x": 0.0, "y": 2.0, "z": 0.0}));

    let cube = &pivot.children[0];
    assert_eq!(cube.properties["mesh"], json!("meshes/cube.glb"));
    assert_eq!(cube.properties["color"], json!({"r": 1.0, "g": 0.0, "b": 0.0, "a": 1.0}));

    let light = &serialized.children[2];
    assert_eq!(light.properties.keys().collect::<Vec<_>>(), vec!["intensity"]);
}

fn document_with_unknown_child() -> SerializedNode {
    SerializedNode::new(SCENE, "Level", "root".into())
        .with_child(SerializedNode::new(NODE_3D, "Before", "before".into()))
        .with_child(
            SerializedNode::new("Teleporter", "Mystery", "mystery".into())
                .with_property("target", json!("elsewhere"))
                .with_child(SerializedNode::new(NODE_3D, "Inner", "inner".into())),
        )
        .with_child(SerializedNode::new(NODE_3D, "After", "after".into()))
}

#[test]
fn test_unknown_child_is_skipped_by_default() {
    let serializer = serializer();
    let scene = serializer
        .deserialize(&document_with_unknown_child(), DeserializeOptions::default())
        .unwrap();

    assert_eq!(names_in_order(&scene.tree), vec!["Level", "Before", "After"]);
    assert_eq!(scene.report.skipped.len(), 1);
    assert!(matches!(
        &scene.report.skipped[0],
        SceneError::UnknownType { tag, node_id } if tag == "Teleporter" && node_id == "mystery"
    ));
}

#[test]
fn test_unknown_child_fails_under_fail_policy() {
    let serializer = serializer();
    let err = serializer
        .deserialize(
            &document_with_unknown_child(),
            DeserializeOptions::with_policy(UnknownTypePolicy::Fail),
        )
        .unwrap_err();
    assert!(matches!(err, SceneError::UnknownType { .. }));
}

#[test]
fn test_unknown_child_is_substituted() {
    let serializer = serializer();
    let scene = serializer
        .deserialize(
            &document_with_unknown_child(),
            DeserializeOptions::with_policy(UnknownTypePolicy::Substitute),
        )
        .unwrap();

    assert_eq!(
        names_in_order(&scene.tree),
        vec!["Level", "Before", "Mystery", "Inner", "After"]
    );
    let mystery = scene.tree.get(&"mystery".into()).unwrap();
    assert_eq!(mystery.type_tag(), SUBSTITUTE_TYPE);
    assert_eq!(scene.report.substituted, vec![NodeId::from("mystery")]);
    // The unknown type's properties have nowhere to go
    assert_eq!(scene.report.property_errors.len(), 1);
}

#[test]
fn test_unknown_root_type_is_an_error() {
    let serializer = serializer();
    let root = SerializedNode::new("Teleporter", "Root", "r".into());
    assert!(matches!(
        serializer.deserialize(&root, DeserializeOptions::default()),
        Err(SceneError::UnknownType { .. })
    ));
}

#[test]
fn test_rejected_property_keeps_default() {
    let serializer = serializer();
    let root = SerializedNode::new(SCENE, "Level", "root".into()).with_child(
        SerializedNode::new(CAMERA_3D, "Camera", "cam".into())
            .with_property("fov", json!(500.0))
            .with_property("near", json!("close"))
            .with_property("far", json!(250.0)),
    );

    let scene = serializer.deserialize(&root, DeserializeOptions::default()).unwrap();
    let camera = scene.tree.get(&"cam".into()).unwrap();
    assert_eq!(camera.field("fov"), Some(&PropertyValue::Number(70.0)));
    assert_eq!(camera.field("near"), Some(&PropertyValue::Number(0.1)));
    assert_eq!(camera.field("far"), Some(&PropertyValue::Number(250.0)));

    assert_eq!(scene.report.property_errors.len(), 2);
    for err in &scene.report.property_errors {
        assert!(matches!(err, SceneError::PropertyAssignment { node_id, .. } if node_id.as_str() == "cam"));
    }
}

#[test]
fn test_activations_collected_in_walk_order() {
    let serializer = serializer();
    let root = SerializedNode::new(SCENE, "Level", "root".into())
        .with_child(SerializedNode::new(CAMERA_3D, "Idle", "idle".into()))
        .with_child(
            SerializedNode::new(NODE_3D, "Rig", "rig".into()).with_child(
                SerializedNode::new(CAMERA_3D, "Main", "main".into())
                    .with_property("current", json!(true)),
            ),
        )
        .with_child(
            SerializedNode::new(CAMERA_3D, "Backup", "backup".into())
                .with_property("current", json!(true)),
        );

    let scene = serializer.deserialize(&root, DeserializeOptions::default()).unwrap();
    let ids: Vec<&str> = scene.activations.iter().map(|a| a.node.as_str()).collect();
    assert_eq!(ids, vec!["main", "backup"]);
    assert!(scene
        .activations
        .iter()
        .all(|a| a.kind == ActivationKind::CurrentCamera));
}

#[test]
fn test_incompatible_version_is_rejected() {
    let serializer = serializer();
    let tree = sample_tree(&serializer);
    let mut document = serializer.document(&tree, "Level").unwrap();
    document.version = "2.1.0".to_string();

    let json = document.to_json().unwrap();
    assert!(matches!(
        SceneDocument::from_json(&json),
        Err(SceneError::IncompatibleVersion { .. })
    ));
    assert!(serializer
        .deserialize_document(&document, DeserializeOptions::default())
        .is_err());
}

#[test]
fn test_serialization_does_not_mutate_tree() {
    let serializer = serializer();
    let tree = sample_tree(&serializer);
    let before = tree.clone();
    let _ = serializer.serialize_tree(&tree).unwrap();
    for node in before.iter() {
        assert_eq!(tree.get(node.id()), Some(node));
    }
}
