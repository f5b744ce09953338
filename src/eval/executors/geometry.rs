use std::sync::Arc;

use crate::eval::context::{ExecutionContext, LogAction, NodeOutput, PortValue};
use crate::eval::executors::primary_output;
use crate::foundation::core::{Value, ValueMap, Vec2};
use crate::foundation::error::FlowResult;
use crate::model::flow::Node;
use crate::model::object::{InitialState, ObjectKind, ObjectLineage, SceneObject};
use crate::registry::nodes::NodeDefinition;
use crate::resolve::{FieldKey, node_resolver};

/// Properties that make up [`InitialState`] rather than the kind-specific property map.
const TRANSFORM_KEYS: [&str; 7] = [
    "position",
    "rotation",
    "scale",
    "opacity",
    "fillColor",
    "strokeColor",
    "strokeWidth",
];

/// Source node: creates one object from the node's resolved properties.
pub(crate) fn execute(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    kind: ObjectKind,
) -> FlowResult<NodeOutput> {
    let id = ctx.unique_object_id(&node.id);
    let object = {
        let res = node_resolver(node, ctx.registries(), &*ctx);
        let obj = Some(id.as_str());
        let num = |key: &str, fallback: f64| {
            res.resolve_f64(&FieldKey::property(key), obj)
                .unwrap_or(fallback)
        };
        let text = |key: &str, fallback: &str| {
            res.resolve(&FieldKey::property(key), obj)
                .and_then(|r| r.value.as_str().map(str::to_owned))
                .unwrap_or_else(|| fallback.to_owned())
        };
        let point = |key: &str, fallback: Vec2| {
            res.resolve_point(&FieldKey::property(key), obj)
                .unwrap_or(fallback)
        };

        let fallback = InitialState::default();
        let initial = InitialState {
            position: point("position", fallback.position),
            rotation: num("rotation", fallback.rotation),
            scale: point("scale", fallback.scale),
            opacity: num("opacity", fallback.opacity).clamp(0.0, 1.0),
            fill_color: text("fillColor", &fallback.fill_color),
            stroke_color: text("strokeColor", &fallback.stroke_color),
            stroke_width: num("strokeWidth", fallback.stroke_width),
        };

        let mut properties = ValueMap::new();
        for schema in def
            .properties
            .iter()
            .filter(|p| !TRANSFORM_KEYS.contains(&p.key.as_str()))
        {
            let value = res
                .resolve(&FieldKey::property(&schema.key), obj)
                .map_or(Value::Null, |r| r.value);
            properties.insert(schema.key.clone(), value);
        }

        SceneObject {
            id: id.clone(),
            kind,
            properties,
            initial,
            appearance_time: None,
            tracks: Vec::new(),
            lineage: ObjectLineage {
                origin_node: node.id.clone(),
                path: vec![node.id.clone()],
            },
        }
    };

    let object = Arc::new(object);
    ctx.register_object(Arc::clone(&object));
    ctx.push_log(
        &node.id,
        LogAction::ObjectCreated,
        serde_json::to_value(&*object).unwrap_or(Value::Null),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Objects(vec![object]),
    ))
}

#[cfg(test)]
#[path = "../../../tests/unit/eval/executors/geometry.rs"]
mod tests;
