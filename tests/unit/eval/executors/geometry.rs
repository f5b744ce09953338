use super::*;
use crate::eval::engine::{ExecuteOptions, execute_flow};
use crate::normalize::pass::{NormalizedFlow, normalize_flow};
use crate::registry::Registries;
use serde_json::json;

fn flow(v: Value) -> NormalizedFlow {
    normalize_flow(&serde_json::from_value(v).unwrap(), &Registries::builtin()).unwrap()
}

#[test]
fn rectangle_object_takes_node_values_and_defaults() {
    let reg = Registries::builtin();
    let f = flow(json!({ "nodes": [
        { "id": "r", "type": "rectangle", "data": { "properties": {
            "width": 240, "position": { "x": 10 }, "fillColor": "#00ff00"
        } } }
    ] }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    let obj = ctx.object("r").unwrap();
    assert_eq!(obj.kind, ObjectKind::Rectangle);
    assert_eq!(obj.initial.position, Vec2::new(10.0, 0.0));
    assert_eq!(obj.initial.fill_color, "#00ff00");
    assert_eq!(obj.initial.scale, Vec2::new(1.0, 1.0));
    assert_eq!(obj.properties["width"], json!(240));
    assert_eq!(obj.properties["height"], json!(60.0));
    assert!(obj.properties.get("position").is_none());
    assert_eq!(obj.lineage.path, ["r"]);
    assert!(obj.appearance_time.is_none());

    let out = ctx.output("r").unwrap().get("output").unwrap();
    assert_eq!(out.as_objects().unwrap().len(), 1);
    assert_eq!(ctx.log()[0].action, LogAction::ObjectCreated);
    assert_eq!(ctx.log()[0].data["id"], json!("r"));
}

#[test]
fn per_object_override_applies_per_axis() {
    let reg = Registries::builtin();
    let f = flow(json!({ "nodes": [
        { "id": "c", "type": "circle", "data": {
            "properties": { "position": { "x": 1, "y": 2 } },
            "perObjectAssignments": { "c": { "initial": { "position": { "x": 50 } } } }
        } }
    ] }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    let obj = ctx.object("c").unwrap();
    assert_eq!(obj.initial.position, Vec2::new(50.0, 2.0));
    assert_eq!(obj.properties["radius"], json!(50.0));
}

#[test]
fn opacity_is_clamped_and_text_defaults_to_white() {
    let reg = Registries::builtin();
    let f = flow(json!({ "nodes": [
        { "id": "t", "type": "text", "data": { "properties": { "opacity": 3, "content": "hi" } } }
    ] }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    let obj = ctx.object("t").unwrap();
    assert_eq!(obj.initial.opacity, 1.0);
    assert_eq!(obj.initial.fill_color, "#ffffff");
    assert_eq!(obj.properties["content"], json!("hi"));
}
