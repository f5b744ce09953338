use crate::eval::context::{ExecutionContext, Inbound, LogAction, NodeOutput};
use crate::eval::executors::{animation, geometry, logic, output, timing};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::FlowGraph;
use crate::model::flow::{Edge, Node};
use crate::registry::Registries;
use crate::registry::nodes::ExecutorKind;
use crate::schema::issue::{Issue, IssueCode};
use crate::schema::validate_flow;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Knobs for [`execute_flow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecuteOptions {
    /// Fail with [`FlowError::MissingTerminal`] when no scene or frame node is present.
    pub require_terminal: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            require_terminal: true,
        }
    }
}

impl ExecuteOptions {
    pub fn scene_optional() -> Self {
        Self {
            require_terminal: false,
        }
    }
}

/// Execute every node in topological order.
///
/// Validation runs first; its soft issues land in the context, its fatal errors (unknown node
/// type, cycle) abort before any executor runs.
#[tracing::instrument(skip_all, fields(nodes = nodes.len(), edges = edges.len()))]
pub fn execute_flow<'a>(
    nodes: &'a [Node],
    edges: &'a [Edge],
    registries: &'a Registries,
    options: &ExecuteOptions,
) -> FlowResult<ExecutionContext<'a>> {
    let (mut ctx, order) = prepare(nodes, edges, registries, options.require_terminal)?;
    for idx in order {
        execute_node(&mut ctx, idx)?;
    }
    tracing::debug!(
        executed = ctx.execution_order().len(),
        objects = ctx.objects().len(),
        issues = ctx.issues().len(),
        "flow executed"
    );
    Ok(ctx)
}

/// Execute only what `target_node_id` depends on, then stop after the target.
///
/// The visited nodes are the target's ancestors plus the target, in the same topological order
/// a full run uses. A terminal node is not required.
#[tracing::instrument(skip(nodes, edges, registries), fields(nodes = nodes.len()))]
pub fn execute_flow_debug<'a>(
    nodes: &'a [Node],
    edges: &'a [Edge],
    registries: &'a Registries,
    target_node_id: &str,
) -> FlowResult<ExecutionContext<'a>> {
    let (mut ctx, order) = prepare(nodes, edges, registries, false)?;
    let target = ctx
        .graph()
        .index_of(target_node_id)
        .ok_or_else(|| FlowError::unknown_node(target_node_id))?;
    let needed = ctx.graph().ancestors(target);

    for idx in order {
        if idx != target && !needed.contains(&idx) {
            continue;
        }
        execute_node(&mut ctx, idx)?;
        if idx == target {
            break;
        }
    }
    ctx.push_log(
        target_node_id,
        LogAction::ExecutionHalted,
        json!({ "visited": ctx.execution_order() }),
    );
    Ok(ctx)
}

fn prepare<'a>(
    nodes: &'a [Node],
    edges: &'a [Edge],
    registries: &'a Registries,
    require_terminal: bool,
) -> FlowResult<(ExecutionContext<'a>, Vec<usize>)> {
    let issues = validate_flow(nodes, edges, registries)?;
    let has_terminal = nodes.iter().any(|n| {
        registries
            .node_type(&n.node_type)
            .is_some_and(|d| d.executor.is_terminal())
    });
    if require_terminal && !has_terminal {
        return Err(FlowError::MissingTerminal);
    }

    let graph = FlowGraph::new(nodes, edges);
    let order = graph.topological_order()?;
    let mut ctx = ExecutionContext::new(registries, graph);
    ctx.extend_issues(issues);
    Ok((ctx, order))
}

fn gather_inbound(ctx: &mut ExecutionContext<'_>, idx: usize) -> Inbound {
    let incoming: Vec<&Edge> = ctx.graph().incoming(idx).collect();
    let mut inbound = Inbound::default();
    let mut skipped = Vec::new();
    for edge in incoming {
        if !edge.is_traversable() {
            skipped.push(edge);
            continue;
        }
        if let Some(v) = ctx
            .output(&edge.source_node_id)
            .and_then(|o| o.get(&edge.source_port_id))
        {
            inbound.push(&edge.target_port_id, v.clone());
        }
    }
    for edge in skipped {
        tracing::warn!(edge = %edge.id, "skipping edge between incompatible ports");
        ctx.push_log(
            &edge.target_node_id,
            LogAction::EdgeSkipped,
            json!({ "edgeId": edge.id, "source": edge.source_port_type, "target": edge.target_port_type }),
        );
        ctx.push_issue(
            Issue::warning(
                IssueCode::SkippedEdge,
                format!("edge '{}' was not traversed", edge.id),
            )
            .at_edge(&edge.id),
        );
    }
    inbound
}

fn execute_node(ctx: &mut ExecutionContext<'_>, idx: usize) -> FlowResult<()> {
    let node = ctx.graph().node(idx);
    if ctx.is_executed(&node.id) {
        return Ok(());
    }
    let def = ctx
        .registries()
        .node_type(&node.node_type)
        .ok_or_else(|| FlowError::unknown_node_type(&node.id, &node.node_type))?;
    let inbound = gather_inbound(ctx, idx);

    let _span = tracing::debug_span!("node", id = %node.id, node_type = %node.node_type).entered();
    let out: NodeOutput = match def.executor {
        ExecutorKind::Geometry { object } => geometry::execute(ctx, node, def, object)?,
        ExecutorKind::Insert => timing::execute(ctx, node, def, &inbound)?,
        ExecutorKind::Filter => logic::filter(ctx, node, def, &inbound)?,
        ExecutorKind::Merge => logic::merge(ctx, node, def, &inbound)?,
        ExecutorKind::Compare => logic::compare(ctx, node, def, &inbound)?,
        ExecutorKind::BooleanOp => logic::boolean_op(ctx, node, def, &inbound)?,
        ExecutorKind::MathOp => logic::math_op(ctx, node, def, &inbound)?,
        ExecutorKind::IfElse => logic::if_else(ctx, node, &inbound)?,
        ExecutorKind::Constant => logic::constant(ctx, node, def)?,
        ExecutorKind::Result => logic::result(ctx, node, def, &inbound)?,
        ExecutorKind::Animation => animation::execute(ctx, node, def, &inbound)?,
        ExecutorKind::Scene | ExecutorKind::Frame => output::execute(ctx, node, &inbound)?,
    };
    tracing::debug!(ports = out.ports.len(), "node executed");
    ctx.record(&node.id, out);
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/eval/engine.rs"]
mod tests;
