use std::collections::HashMap;
use std::sync::Arc;

use crate::eval::context::{ExecutionContext, Inbound, LogAction, NodeOutput};
use crate::eval::executors::ids;
use crate::foundation::error::FlowResult;
use crate::model::flow::Node;
use crate::model::object::SceneObject;
use serde_json::json;

/// Terminal node: takes in every inbound stream, one object per id, and registers itself as a
/// partition root. Produces no output.
pub(crate) fn execute(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let mut received: Vec<Arc<SceneObject>> = Vec::new();
    let mut position = HashMap::<String, usize>::new();
    for port in inbound.ports() {
        for obj in inbound.stream(port) {
            match position.get(&obj.id) {
                Some(&i) => Arc::make_mut(&mut received[i]).merge_missing_from(&obj),
                None => {
                    position.insert(obj.id.clone(), received.len());
                    received.push(obj);
                }
            }
        }
    }

    ctx.push_log(
        &node.id,
        LogAction::PartitionRootRegistered,
        json!({ "displayName": node.display_name(), "objectIds": ids(&received) }),
    );
    ctx.register_terminal(&node.id, received);
    Ok(NodeOutput::default())
}

#[cfg(test)]
#[path = "../../../tests/unit/eval/executors/output.rs"]
mod tests;
