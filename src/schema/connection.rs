use std::collections::HashMap;

use crate::graph::FlowGraph;
use crate::registry::Registries;
use crate::schema::issue::{Issue, IssueCode};

/// Port existence, port-type compatibility and single-connection inputs.
pub fn validate_connections(graph: &FlowGraph<'_>, registries: &Registries) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut fan_in = HashMap::<(&str, &str), usize>::new();

    for e in graph.edges() {
        let (Some(src), Some(tgt)) = (graph.get(&e.source_node_id), graph.get(&e.target_node_id))
        else {
            continue;
        };
        let (Some(src_def), Some(tgt_def)) = (
            registries.node_type(&src.node_type),
            registries.node_type(&tgt.node_type),
        ) else {
            continue;
        };

        let out = src_def.output(&e.source_port_id);
        let inp = tgt_def.input(&e.target_port_id);
        if out.is_none() {
            issues.push(
                Issue::error(
                    IssueCode::UnknownPort,
                    format!(
                        "{} has no output port '{}'",
                        src.display_name(),
                        e.source_port_id
                    ),
                )
                .at_edge(&e.id)
                .at_node(&src.id),
            );
        }
        if inp.is_none() {
            issues.push(
                Issue::error(
                    IssueCode::UnknownPort,
                    format!(
                        "{} has no input port '{}'",
                        tgt.display_name(),
                        e.target_port_id
                    ),
                )
                .at_edge(&e.id)
                .at_node(&tgt.id),
            );
        }
        let (Some(out), Some(inp)) = (out, inp) else {
            continue;
        };

        if !registries.ports_compatible(out.port_type, inp.port_type) {
            issues.push(
                Issue::error(
                    IssueCode::IncompatiblePorts,
                    format!(
                        "cannot connect {} output '{}' ({}) to {} input '{}' ({})",
                        src.display_name(),
                        out.id,
                        out.port_type,
                        tgt.display_name(),
                        inp.id,
                        inp.port_type
                    ),
                )
                .at_edge(&e.id)
                .suggest("Connect to an input that accepts this port type"),
            );
        }

        let count = fan_in
            .entry((e.target_node_id.as_str(), e.target_port_id.as_str()))
            .or_insert(0);
        *count += 1;
        if *count > 1 && !inp.multiple {
            issues.push(
                Issue::error(
                    IssueCode::PortAlreadyConnected,
                    format!(
                        "input '{}' of {} accepts a single connection",
                        inp.id,
                        tgt.display_name()
                    ),
                )
                .at_edge(&e.id)
                .at_node(&tgt.id)
                .suggest("Combine the streams with a Merge node first"),
            );
        }
    }

    issues
}

#[cfg(test)]
#[path = "../../tests/unit/schema/connection.rs"]
mod tests;
