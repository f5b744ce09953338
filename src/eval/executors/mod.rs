//! Per-category evaluation rules. Each executor reads the node, its inbound values and the
//! resolved fields, and returns the node's output; log and issue bookkeeping goes through the
//! context.

pub(crate) mod animation;
pub(crate) mod geometry;
pub(crate) mod logic;
pub(crate) mod output;
pub(crate) mod timing;

use std::sync::Arc;

use crate::foundation::core::Value;
use crate::model::object::SceneObject;
use crate::registry::nodes::NodeDefinition;

/// First declared output port, which carries the stream for single-output nodes.
pub(crate) fn primary_output(def: &NodeDefinition) -> &str {
    def.outputs.first().map_or("output", |p| p.id.as_str())
}

/// Full serializable copy of a stream for the execution log.
pub(crate) fn snapshot(objects: &[Arc<SceneObject>]) -> Value {
    serde_json::to_value(objects).unwrap_or(Value::Null)
}

/// Ids of a stream, in order.
pub(crate) fn ids(objects: &[Arc<SceneObject>]) -> Vec<&str> {
    objects.iter().map(|o| o.id.as_str()).collect()
}
