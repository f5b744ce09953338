pub use kurbo::Vec2;

/// Property value as stored in node data and scene objects.
pub type Value = serde_json::Value;

/// Ordered JSON object map.
pub type ValueMap = serde_json::Map<String, Value>;

/// Node identifier (the immutable `Identifier::id`).
pub type NodeId = String;
/// Edge identifier.
pub type EdgeId = String;
/// Port identifier, unique per node type and direction.
pub type PortId = String;
/// Scene object identifier, unique within one execution.
pub type ObjectId = String;
/// Animation track identifier, unique within its animation node.
pub type TrackId = String;

/// Read a dotted path (`"from.x"`) out of a JSON value.
///
/// A literal key containing the dots wins over descending, so both `{"from.x": 1}` and
/// `{"from": {"x": 1}}` answer `"from.x"`.
pub fn lookup_path<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    if path.is_empty() {
        return Some(value);
    }
    let obj = value.as_object()?;
    lookup_in_map(obj, path)
}

/// [`lookup_path`] over a map root.
pub fn lookup_in_map<'v>(map: &'v ValueMap, path: &str) -> Option<&'v Value> {
    if let Some(v) = map.get(path) {
        return Some(v);
    }
    let mut split = path.len();
    while let Some(dot) = path[..split].rfind('.') {
        if let Some(v) = map.get(&path[..dot])
            && let Some(found) = lookup_path(v, &path[dot + 1..])
        {
            return Some(found);
        }
        split = dot;
    }
    None
}

/// Fill keys missing from `dst` with values from `src`, recursing into nested objects.
///
/// Keys already present in `dst` are never overwritten.
pub fn merge_missing(dst: &mut ValueMap, src: &ValueMap) {
    for (k, v) in src {
        match dst.get_mut(k) {
            None => {
                dst.insert(k.clone(), v.clone());
            }
            Some(Value::Object(d)) => {
                if let Value::Object(s) = v {
                    merge_missing(d, s);
                }
            }
            Some(Value::Null) => {
                dst.insert(k.clone(), v.clone());
            }
            Some(_) => {}
        }
    }
}

/// Parse a `{ "x": .., "y": .. }` JSON object.
pub fn value_to_vec2(v: &Value) -> Option<Vec2> {
    let x = v.get("x")?.as_f64()?;
    let y = v.get("y")?.as_f64()?;
    Some(Vec2::new(x, y))
}

/// Encode a vector as a `{ "x": .., "y": .. }` JSON object.
pub fn vec2_to_value(v: Vec2) -> Value {
    serde_json::json!({ "x": v.x, "y": v.y })
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
