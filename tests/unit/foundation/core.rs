use super::*;
use serde_json::json;

#[test]
fn lookup_path_descends_nested_objects() {
    let v = json!({ "from": { "x": 3.0, "y": 4.0 } });
    assert_eq!(lookup_path(&v, "from.x"), Some(&json!(3.0)));
    assert_eq!(lookup_path(&v, "from"), Some(&json!({ "x": 3.0, "y": 4.0 })));
    assert_eq!(lookup_path(&v, "from.z"), None);
    assert_eq!(lookup_path(&v, "to.x"), None);
}

#[test]
fn lookup_path_prefers_literal_dotted_keys() {
    let v = json!({ "from.x": 1.0, "from": { "x": 2.0 } });
    assert_eq!(lookup_path(&v, "from.x"), Some(&json!(1.0)));
}

#[test]
fn merge_missing_never_overwrites_set_fields() {
    let mut dst = json!({ "a": 1, "nested": { "x": 1 }, "gap": null })
        .as_object()
        .cloned()
        .unwrap();
    let src = json!({ "a": 2, "b": 3, "nested": { "x": 9, "y": 9 }, "gap": 5 })
        .as_object()
        .cloned()
        .unwrap();
    merge_missing(&mut dst, &src);
    assert_eq!(
        Value::Object(dst),
        json!({ "a": 1, "b": 3, "nested": { "x": 1, "y": 9 }, "gap": 5 })
    );
}

#[test]
fn vec2_json_conversion() {
    let v = vec2_to_value(Vec2::new(1.5, -2.0));
    assert_eq!(value_to_vec2(&v), Some(Vec2::new(1.5, -2.0)));
    assert_eq!(value_to_vec2(&json!({ "x": 1 })), None);
}
