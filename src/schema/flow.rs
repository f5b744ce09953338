use std::collections::{BTreeMap, HashSet};

use crate::foundation::core::Value;
use crate::graph::FlowGraph;
use crate::model::flow::Node;
use crate::registry::Registries;
use crate::registry::nodes::{ExecutorKind, NodeCategory, PropertySchema};
use crate::resolve::FieldKey;
use crate::schema::issue::{Issue, IssueCode};

/// Semantic checks over a structurally sound flow.
pub fn validate_semantics(graph: &FlowGraph<'_>, registries: &Registries) -> Vec<Issue> {
    let mut issues = Vec::new();
    required_ports(graph, registries, &mut issues);
    display_names(graph, &mut issues);
    terminals_have_geometry(graph, registries, &mut issues);
    for node in graph.nodes() {
        properties(node, registries, &mut issues);
    }
    bindings(graph, registries, &mut issues);
    issues
}

fn required_ports(graph: &FlowGraph<'_>, registries: &Registries, issues: &mut Vec<Issue>) {
    for (idx, node) in graph.nodes().iter().enumerate() {
        let Some(def) = registries.node_type(&node.node_type) else {
            continue;
        };
        let connected: HashSet<&str> = graph
            .incoming(idx)
            .map(|e| e.target_port_id.as_str())
            .collect();
        for port in def.inputs.iter().filter(|p| p.required) {
            if !connected.contains(port.id.as_str()) {
                issues.push(
                    Issue::warning(
                        IssueCode::DisconnectedRequiredPort,
                        format!(
                            "required input '{}' of {} is not connected",
                            port.id,
                            node.display_name()
                        ),
                    )
                    .at_node(&node.id),
                );
            }
        }
    }
}

fn display_names(graph: &FlowGraph<'_>, issues: &mut Vec<Issue>) {
    let mut by_name = BTreeMap::<&str, Vec<&str>>::new();
    for n in graph.nodes() {
        by_name.entry(n.display_name()).or_default().push(&n.id);
    }
    for (name, ids) in by_name {
        if ids.len() < 2 {
            continue;
        }
        for id in &ids[1..] {
            issues.push(
                Issue::warning(
                    IssueCode::DuplicateDisplayName,
                    format!("display name '{name}' is used by {} nodes", ids.len()),
                )
                .at_node(id)
                .suggest("Rename the node so results and bindings stay unambiguous"),
            );
        }
    }
}

fn terminals_have_geometry(
    graph: &FlowGraph<'_>,
    registries: &Registries,
    issues: &mut Vec<Issue>,
) {
    let category = |idx: usize| {
        registries
            .node_type(&graph.node(idx).node_type)
            .map(|d| d.category())
    };
    for idx in 0..graph.len() {
        if category(idx) != Some(NodeCategory::Output) {
            continue;
        }
        let fed = graph
            .edge_ancestors(idx)
            .into_iter()
            .any(|a| category(a) == Some(NodeCategory::Geometry));
        if !fed {
            let node = graph.node(idx);
            issues.push(
                Issue::warning(
                    IssueCode::NoGeometryUpstream,
                    format!(
                        "{} has no shape, text or image node upstream",
                        node.display_name()
                    ),
                )
                .at_node(&node.id)
                .suggest("Connect a geometry node to this output"),
            );
        }
    }
}

fn check_value(
    node: &Node,
    label: &str,
    schema: &PropertySchema,
    value: &Value,
    registries: &Registries,
    issues: &mut Vec<Issue>,
) {
    if !registries.interpolators.validate(schema.value_type, value) {
        issues.push(
            Issue::warning(
                IssueCode::InvalidPropertyType,
                format!("{label} on {} has the wrong type: {value}", node.display_name()),
            )
            .at_node(&node.id),
        );
        return;
    }
    if let Some(why) = schema.constraints.violation(value) {
        issues.push(
            Issue::warning(
                IssueCode::ConstraintViolation,
                format!("{label} on {}: {why}", node.display_name()),
            )
            .at_node(&node.id),
        );
    }
}

fn properties(node: &Node, registries: &Registries, issues: &mut Vec<Issue>) {
    let Some(def) = registries.node_type(&node.node_type) else {
        return;
    };
    for schema in &def.properties {
        if let Some(v) = node.data.stored_value(&schema.key) {
            check_value(node, &schema.key, schema, v, registries, issues);
        }
    }
    for track in &node.data.tracks {
        let Some(tdef) = registries.tracks.get(track.kind) else {
            continue;
        };
        for schema in &tdef.properties {
            if let Some(v) = track.field(&schema.key) {
                let label = format!("track '{}' field {}", track.identifier, schema.key);
                check_value(node, &label, schema, v, registries, issues);
            }
        }
    }
}

/// Binding targets must exist and be result nodes, track-scoped keys must name a track of the
/// node, and a target with nothing wired into it never produces a value.
fn bindings(graph: &FlowGraph<'_>, registries: &Registries, issues: &mut Vec<Issue>) {
    for node in graph.nodes() {
        for (_, key, binding) in node.data.bindings.iter() {
            if let FieldKey::Track { track_id, .. } = FieldKey::parse(key)
                && node.data.track(&track_id).is_none()
            {
                issues.push(
                    Issue::warning(
                        IssueCode::UnknownBindingField,
                        format!(
                            "field '{key}' on {} names track '{track_id}', which the node does not have",
                            node.display_name()
                        ),
                    )
                    .at_node(&node.id),
                );
            }

            let target = &binding.bound_result_node_id;
            let Some(t_idx) = graph.index_of(target) else {
                issues.push(
                    Issue::warning(
                        IssueCode::UnknownBindingTarget,
                        format!(
                            "field '{key}' on {} is bound to missing node '{target}'",
                            node.display_name()
                        ),
                    )
                    .at_node(&node.id)
                    .suggest("Re-bind the field or remove the binding"),
                );
                continue;
            };
            let is_result = registries
                .node_type(&graph.node(t_idx).node_type)
                .is_some_and(|d| d.executor == ExecutorKind::Result);
            if !is_result {
                issues.push(
                    Issue::warning(
                        IssueCode::BindingTargetNotResult,
                        format!(
                            "field '{key}' on {} is bound to a node that is not a Result",
                            node.display_name()
                        ),
                    )
                    .at_node(&node.id),
                );
            } else if !graph.incoming(t_idx).any(|e| e.is_traversable()) {
                issues.push(
                    Issue::info(
                        IssueCode::UnfedBindingTarget,
                        format!(
                            "field '{key}' on {} is bound to {}, which has no input; the binding never applies",
                            node.display_name(),
                            graph.node(t_idx).display_name()
                        ),
                    )
                    .at_node(&node.id)
                    .suggest("Connect a value to the result node"),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schema/flow.rs"]
mod tests;
