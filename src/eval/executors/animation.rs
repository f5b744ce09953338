use std::sync::Arc;

use crate::animation::ease::Ease;
use crate::animation::track::{AnimationTrack, TrackSpec};
use crate::eval::context::{ExecutionContext, Inbound, LogAction, NodeOutput, PortValue};
use crate::eval::executors::{ids, primary_output};
use crate::foundation::core::{Value, ValueMap, vec2_to_value};
use crate::foundation::error::FlowResult;
use crate::model::flow::Node;
use crate::registry::Registries;
use crate::registry::interp::ValueType;
use crate::registry::nodes::NodeDefinition;
use crate::resolve::{FieldKey, FieldSource, node_resolver};
use serde_json::json;

/// Attach the node's tracks to every inbound object, resolving each track field for that
/// object. Nothing is sampled here.
pub(crate) fn execute(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let input = def.inputs.first().map_or("input", |p| p.id.as_str());
    let registries = ctx.registries();
    let stream: Vec<_> = {
        let res = node_resolver(node, registries, &*ctx);
        inbound
            .stream(input)
            .into_iter()
            .map(|mut obj| {
                let tracks: Vec<_> = node
                    .data
                    .tracks
                    .iter()
                    .map(|spec| resolve_track(&res, spec, &obj.id, registries))
                    .collect();
                let o = Arc::make_mut(&mut obj);
                for track in tracks {
                    match o.tracks.iter_mut().find(|t| t.identifier == track.identifier) {
                        Some(existing) => *existing = track,
                        None => o.tracks.push(track),
                    }
                }
                o.visit(&node.id);
                obj
            })
            .collect()
    };

    let track_ids: Vec<&str> = node
        .data
        .tracks
        .iter()
        .map(|t| t.identifier.as_str())
        .collect();
    let attached: Vec<Value> = stream
        .iter()
        .map(|o| json!({ "id": o.id, "tracks": o.tracks }))
        .collect();
    ctx.push_log(
        &node.id,
        LogAction::TrackAttached,
        json!({ "objectIds": ids(&stream), "trackIds": track_ids, "objects": attached }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Objects(stream),
    ))
}

fn resolve_track(
    res: &impl FieldSource,
    spec: &TrackSpec,
    object_id: &str,
    registries: &Registries,
) -> AnimationTrack {
    let get = |path: &str| {
        res.lookup(&FieldKey::track(&spec.identifier, path), Some(object_id))
            .map(|r| r.value)
    };
    let num = |path: &str, fallback: f64| get(path).and_then(|v| v.as_f64()).unwrap_or(fallback);

    let easing = get("easing")
        .and_then(|v| v.as_str().and_then(Ease::from_name))
        .unwrap_or_default();

    let mut properties = ValueMap::new();
    if let Some(def) = registries.tracks.get(spec.kind) {
        for schema in def.specific_properties() {
            let value = if schema.value_type == ValueType::Point {
                resolve_point(&get, &schema.key)
            } else {
                get(&schema.key)
            };
            properties.insert(schema.key.clone(), value.unwrap_or(Value::Null));
        }
    }
    // user fields outside the schema ride along untouched
    for (k, v) in &spec.fields {
        if !properties.contains_key(k)
            && !matches!(k.as_str(), "startTime" | "duration" | "easing")
        {
            properties.insert(k.clone(), v.clone());
        }
    }

    AnimationTrack {
        identifier: spec.identifier.clone(),
        kind: spec.kind,
        start_time: num("startTime", 0.0).max(0.0),
        duration: num("duration", 1.0).max(0.0),
        easing,
        properties,
    }
}

/// Point fields resolve per axis. A non-point value at the whole key (a uniform scale) is kept.
fn resolve_point(get: &impl Fn(&str) -> Option<Value>, key: &str) -> Option<Value> {
    let x = get(&format!("{key}.x")).and_then(|v| v.as_f64());
    let y = get(&format!("{key}.y")).and_then(|v| v.as_f64());
    match (x, y) {
        (Some(x), Some(y)) => Some(vec2_to_value(crate::foundation::core::Vec2::new(x, y))),
        _ => get(key),
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/eval/executors/animation.rs"]
mod tests;
