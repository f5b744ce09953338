pub mod connection;
pub mod flow;
pub mod issue;
pub mod logic;
pub mod structural;

use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::FlowGraph;
use crate::model::flow::{Edge, Node};
use crate::registry::Registries;
use issue::Issue;

/// Run every validator and collect their issues.
///
/// Only unrecoverable faults are returned as errors: a node type missing from the registry or
/// a cycle. Everything else comes back in the list, so all problems surface at once.
#[tracing::instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn validate_flow(
    nodes: &[Node],
    edges: &[Edge],
    registries: &Registries,
) -> FlowResult<Vec<Issue>> {
    if let Some(n) = nodes
        .iter()
        .find(|n| registries.node_type(&n.node_type).is_none())
    {
        return Err(FlowError::unknown_node_type(&n.id, &n.node_type));
    }

    let graph = FlowGraph::new(nodes, edges);
    graph.topological_order()?;

    let mut issues = structural::validate_structure(&graph, registries);
    issues.extend(connection::validate_connections(&graph, registries));
    issues.extend(flow::validate_semantics(&graph, registries));
    issues.extend(logic::validate_logic(&graph, registries));

    for i in &issues {
        if i.is_error() {
            tracing::warn!(code = %i.code, node = ?i.node_id, edge = ?i.edge_id, "{}", i.message);
        } else {
            tracing::debug!(code = %i.code, node = ?i.node_id, "{}", i.message);
        }
    }
    Ok(issues)
}

#[cfg(test)]
#[path = "../../tests/unit/schema/mod.rs"]
mod tests;
