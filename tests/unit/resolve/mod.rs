use super::*;
use crate::normalize::pass::normalize_flow;
use serde_json::json;
use std::collections::HashMap;

struct Live(HashMap<String, Value>);

impl LiveValues for Live {
    fn live_value(&self, node_id: &str) -> Option<&Value> {
        self.0.get(node_id)
    }
}

fn node(data: Value) -> Node {
    let doc = serde_json::from_value(json!({
        "nodes": [{ "id": "r", "type": "rectangle", "data": data }]
    }))
    .unwrap();
    normalize_flow(&doc, &Registries::builtin())
        .unwrap()
        .nodes
        .remove(0)
}

fn live(pairs: &[(&str, Value)]) -> Live {
    Live(pairs.iter().map(|(k, v)| ((*k).to_owned(), v.clone())).collect())
}

fn full() -> Value {
    json!({
        "properties": { "width": 10 },
        "perObjectAssignments": { "o1": { "initial": { "width": 20 } } },
        "variableBindings": { "width": "res" }
    })
}

#[test]
fn precedence_binding_then_override_then_node_then_default() {
    let reg = Registries::builtin();
    let key = FieldKey::property("width");
    let lv = live(&[("res", json!(30))]);

    let n = node(full());
    let r = node_resolver(&n, &reg, &lv).resolve(&key, Some("o1")).unwrap();
    assert_eq!(r.value, json!(30));
    assert_eq!(r.tier, Tier::Binding { node_id: "res".to_owned() });

    let mut without_binding = full();
    without_binding["variableBindings"] = json!({});
    let n = node(without_binding.clone());
    let r = node_resolver(&n, &reg, &lv).resolve(&key, Some("o1")).unwrap();
    assert_eq!((r.value, r.tier), (json!(20), Tier::Override));

    without_binding["perObjectAssignments"] = json!({});
    let n = node(without_binding.clone());
    let r = node_resolver(&n, &reg, &lv).resolve(&key, Some("o1")).unwrap();
    assert_eq!((r.value, r.tier), (json!(10), Tier::NodeValue));

    without_binding["properties"] = json!({});
    let n = node(without_binding);
    let r = node_resolver(&n, &reg, &lv).resolve(&key, Some("o1")).unwrap();
    assert_eq!((r.value, r.tier), (json!(100.0), Tier::RegistryDefault));
}

#[test]
fn unproduced_binding_falls_through() {
    let reg = Registries::builtin();
    let n = node(full());
    let r = node_resolver(&n, &reg, &live(&[]))
        .resolve(&FieldKey::property("width"), Some("o1"))
        .unwrap();
    assert_eq!(r.tier, Tier::Override);
}

#[test]
fn unproduced_object_binding_yields_to_node_binding() {
    let reg = Registries::builtin();
    let n = node(json!({
        "properties": { "width": 10 },
        "variableBindings": { "width": "res" },
        "perObjectBindings": { "box": { "width": "dead" } }
    }));
    let lv = live(&[("res", json!(55))]);
    let r = node_resolver(&n, &reg, &lv)
        .resolve(&FieldKey::property("width"), Some("box"))
        .unwrap();
    assert_eq!(r.value, json!(55));
    assert_eq!(r.tier, Tier::Binding { node_id: "res".to_owned() });

    let lv = live(&[("res", json!(55)), ("dead", json!(66))]);
    let r = node_resolver(&n, &reg, &lv)
        .resolve(&FieldKey::property("width"), Some("box"))
        .unwrap();
    assert_eq!(r.value, json!(66));
}

#[test]
fn overrides_apply_only_to_their_object() {
    let reg = Registries::builtin();
    let mut d = full();
    d["variableBindings"] = json!({});
    let n = node(d);
    let empty_live = live(&[]);
    let res = node_resolver(&n, &reg, &empty_live);
    assert_eq!(res.resolve(&FieldKey::property("width"), Some("o2")).unwrap().tier, Tier::NodeValue);
    assert_eq!(res.resolve(&FieldKey::property("width"), None).unwrap().tier, Tier::NodeValue);
}

#[test]
fn sibling_axes_resolve_independently() {
    let reg = Registries::builtin();
    let n = node(json!({
        "properties": { "position": { "x": 1, "y": 2 } },
        "perObjectAssignments": { "o": { "initial": { "position": { "y": 7 } } } },
        "perObjectBindings": { "o": { "position.x": "res" } }
    }));
    let lv = live(&[("res", json!(42))]);
    let res = node_resolver(&n, &reg, &lv);
    assert_eq!(
        res.resolve_point(&FieldKey::property("position"), Some("o")),
        Some(Vec2::new(42.0, 7.0))
    );
    assert_eq!(
        res.resolve_point(&FieldKey::property("position"), None),
        Some(Vec2::new(1.0, 2.0))
    );
}

#[test]
fn whole_point_binding_feeds_each_axis() {
    let reg = Registries::builtin();
    let n = node(json!({ "variableBindings": { "scale": "res" } }));
    let lv = live(&[("res", json!({ "x": 2.0, "y": 3.0 }))]);
    let res = node_resolver(&n, &reg, &lv);
    assert_eq!(
        res.resolve_point(&FieldKey::property("scale"), None),
        Some(Vec2::new(2.0, 3.0))
    );
}

#[test]
fn track_fields_use_the_same_tiers() {
    let reg = Registries::builtin();
    let n = node(json!({
        "tracks": [{ "identifier": "t1", "type": "move", "to": { "x": 50 } }],
        "perObjectAssignments": { "o": { "trackOverrides": { "t1": { "duration": 3 } } } },
        "variableBindings": { "track:t1:to.y": "res" }
    }));
    let lv = live(&[("res", json!(9))]);
    let res = node_resolver(&n, &reg, &lv);
    let get = |path: &str| res.resolve(&FieldKey::track("t1", path), Some("o")).unwrap();
    assert_eq!(get("to.x").tier, Tier::NodeValue);
    assert_eq!(get("to.y").value, json!(9));
    assert_eq!(get("duration").tier, Tier::Override);
    assert_eq!(get("from.x").value, json!(0.0));
    assert_eq!(get("from.x").tier, Tier::RegistryDefault);
    assert!(res.resolve(&FieldKey::track("nope", "to.x"), Some("o")).is_none());
}

#[test]
fn resolution_is_idempotent() {
    let reg = Registries::builtin();
    let n = node(full());
    let lv = live(&[("res", json!(30))]);
    let res = node_resolver(&n, &reg, &lv);
    let key = FieldKey::property("width");
    assert_eq!(res.resolve(&key, Some("o1")), res.resolve(&key, Some("o1")));
}

#[test]
fn field_keys_parse_and_print_binding_spelling() {
    assert_eq!(FieldKey::parse("track:t1:from.x"), FieldKey::track("t1", "from.x"));
    assert_eq!(FieldKey::parse("opacity"), FieldKey::property("opacity"));
    assert_eq!(FieldKey::track("t1", "to").to_string(), "track:t1:to");
}
