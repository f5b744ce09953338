use std::collections::HashSet;

use crate::graph::FlowGraph;
use crate::registry::Registries;
use crate::schema::issue::{Issue, IssueCode};

/// Terminal presence, id uniqueness and edge endpoints.
pub fn validate_structure(graph: &FlowGraph<'_>, registries: &Registries) -> Vec<Issue> {
    let mut issues = Vec::new();

    let has_terminal = graph.nodes().iter().any(|n| {
        registries
            .node_type(&n.node_type)
            .is_some_and(|d| d.executor.is_terminal())
    });
    if !has_terminal {
        issues.push(
            Issue::error(
                IssueCode::MissingTerminalNode,
                "flow has no scene or frame output node",
            )
            .suggest("Add a Scene or Frame node and connect your objects to it"),
        );
    }

    let mut seen = HashSet::new();
    for n in graph.nodes() {
        if !seen.insert(n.id.as_str()) {
            issues.push(
                Issue::error(
                    IssueCode::DuplicateNodeId,
                    format!("node id '{}' is used more than once", n.id),
                )
                .at_node(&n.id),
            );
        }
    }

    let mut seen = HashSet::new();
    for e in graph.edges() {
        if !seen.insert(e.id.as_str()) {
            issues.push(
                Issue::warning(
                    IssueCode::DuplicateEdgeId,
                    format!("edge id '{}' is used more than once", e.id),
                )
                .at_edge(&e.id),
            );
        }

        let missing: Vec<&str> = [e.source_node_id.as_str(), e.target_node_id.as_str()]
            .into_iter()
            .filter(|id| graph.index_of(id).is_none())
            .collect();
        if !missing.is_empty() {
            issues.push(
                Issue::error(
                    IssueCode::DanglingEdge,
                    format!(
                        "edge '{}' references missing node(s) {}",
                        e.id,
                        missing.join(", ")
                    ),
                )
                .at_edge(&e.id)
                .suggest("Delete the connection and reconnect the nodes"),
            );
        }
    }

    issues
}

#[cfg(test)]
#[path = "../../tests/unit/schema/structural.rs"]
mod tests;
