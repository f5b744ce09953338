use std::path::Path;

use crate::compile::partition::{ScenePartition, partition_objects_by_scenes};
use crate::eval::context::ExecutionContext;
use crate::eval::engine::{ExecuteOptions, execute_flow};
use crate::foundation::error::{FlowError, FlowResult};
use crate::model::flow::Node;
use crate::normalize::defs::FlowDocument;
use crate::normalize::pass::{NormalizedFlow, normalize_flow};
use crate::registry::Registries;
use serde::Serialize;

/// Outcome of [`run_flow`]: the run's context (log, issues, objects) and its partitions.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowRun<'a> {
    pub context: ExecutionContext<'a>,
    pub partitions: Vec<ScenePartition>,
}

/// Read a flow document from disk and normalize it.
pub fn load_flow(path: &Path, registries: &Registries) -> FlowResult<NormalizedFlow> {
    let doc = FlowDocument::from_path(path)?;
    normalize_flow(&doc, registries)
}

/// Execute a normalized flow and partition the result.
///
/// Fails with [`FlowError::NoValidScenes`] when no terminal received an object.
#[tracing::instrument(skip_all, fields(nodes = flow.nodes.len()))]
pub fn run_flow<'a>(
    flow: &'a NormalizedFlow,
    registries: &'a Registries,
    options: &ExecuteOptions,
) -> FlowResult<FlowRun<'a>> {
    let context = execute_flow(&flow.nodes, &flow.edges, registries, options)?;
    let terminals: Vec<Node> = flow
        .nodes
        .iter()
        .filter(|n| {
            registries
                .node_type(&n.node_type)
                .is_some_and(|d| d.executor.is_terminal())
        })
        .cloned()
        .collect();

    let partitions = partition_objects_by_scenes(&context, &terminals, &flow.edges);
    if partitions.is_empty() && (options.require_terminal || !terminals.is_empty()) {
        return Err(FlowError::NoValidScenes);
    }
    tracing::info!(partitions = partitions.len(), "flow partitioned");
    Ok(FlowRun {
        context,
        partitions,
    })
}
