use std::sync::Arc;

use crate::eval::context::{ExecutionContext, Inbound, LogAction, NodeOutput, PortValue};
use crate::eval::executors::primary_output;
use crate::foundation::error::FlowResult;
use crate::model::flow::Node;
use crate::registry::nodes::NodeDefinition;
use crate::resolve::{FieldKey, node_resolver};
use serde_json::json;

/// Stamp an appearance time on every inbound object. The time resolves per object, so single
/// objects may be overridden or bound.
pub(crate) fn execute(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let input = def.inputs.first().map_or("input", |p| p.id.as_str());
    let key = FieldKey::property("appearanceTime");
    let stream: Vec<_> = {
        let res = node_resolver(node, ctx.registries(), &*ctx);
        inbound
            .stream(input)
            .into_iter()
            .map(|mut obj| {
                let t = res
                    .resolve_f64(&key, Some(obj.id.as_str()))
                    .unwrap_or(0.0)
                    .max(0.0);
                let o = Arc::make_mut(&mut obj);
                o.appearance_time = Some(t);
                o.visit(&node.id);
                obj
            })
            .collect()
    };

    let stamped: Vec<_> = stream
        .iter()
        .map(|o| json!({ "id": o.id, "appearanceTime": o.appearance_time }))
        .collect();
    ctx.push_log(
        &node.id,
        LogAction::AppearanceStamped,
        json!({ "objects": stamped }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Objects(stream),
    ))
}

#[cfg(test)]
#[path = "../../../tests/unit/eval/executors/timing.rs"]
mod tests;
