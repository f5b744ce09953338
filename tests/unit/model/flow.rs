use super::*;
use serde_json::json;

fn data() -> NodeData {
    NodeData {
        identifier: Identifier {
            id: "n".to_owned(),
            node_type: "rectangle".to_owned(),
            created_at: Utc::now(),
            sequence: 1,
            display_name: "Rectangle 1".to_owned(),
        },
        lineage: Lineage::default(),
        properties: json!({ "width": 10.0, "position": { "x": 5.0, "y": 0.0 }, "height": 60.0 })
            .as_object()
            .cloned()
            .unwrap(),
        defaulted: ["height".to_owned(), "position.y".to_owned()].into(),
        assignments: BTreeMap::new(),
        bindings: VariableBindings::default(),
        tracks: vec![],
    }
}

#[test]
fn stored_value_hides_registry_filled_paths() {
    let d = data();
    assert_eq!(d.stored_value("width"), Some(&json!(10.0)));
    assert_eq!(d.stored_value("height"), None);
    assert_eq!(d.stored_value("position.x"), Some(&json!(5.0)));
    assert_eq!(d.stored_value("position.y"), None);
}

#[test]
fn per_object_binding_is_tried_before_node_binding() {
    let mut b = VariableBindings::default();
    b.node.insert(
        "opacity".to_owned(),
        Binding {
            bound_result_node_id: "r1".to_owned(),
        },
    );
    b.per_object.entry("o1".to_owned()).or_default().insert(
        "opacity".to_owned(),
        Binding {
            bound_result_node_id: "r2".to_owned(),
        },
    );
    let targets = |key: &str, object: Option<&str>| -> Vec<String> {
        b.lookup(key, object)
            .map(|b| b.bound_result_node_id.clone())
            .collect()
    };
    assert_eq!(targets("opacity", Some("o1")), ["r2", "r1"]);
    assert_eq!(targets("opacity", Some("o2")), ["r1"]);
    assert_eq!(targets("opacity", None), ["r1"]);
    assert!(targets("rotation", None).is_empty());
    assert_eq!(b.iter().count(), 2);
}

#[test]
fn edges_without_known_port_types_are_not_traversable() {
    let mut e = Edge {
        id: "e".to_owned(),
        source_node_id: "a".to_owned(),
        source_port_id: "output".to_owned(),
        source_port_type: Some(PortType::Geometry),
        target_node_id: "b".to_owned(),
        target_port_id: "input".to_owned(),
        target_port_type: Some(PortType::ObjectStream),
    };
    assert!(e.is_traversable());
    e.target_port_type = Some(PortType::Number);
    assert!(!e.is_traversable());
    e.target_port_type = None;
    assert!(!e.is_traversable());
}
