use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::eval::context::{ExecutionContext, Inbound, LogAction, NodeOutput, PortValue};
use crate::eval::executors::{ids, primary_output};
use crate::foundation::core::Value;
use crate::foundation::error::FlowResult;
use crate::model::flow::Node;
use crate::model::object::SceneObject;
use crate::registry::nodes::NodeDefinition;
use crate::resolve::{FieldKey, node_resolver};
use crate::schema::issue::{Issue, IssueCode};
use crate::schema::logic::{OperandKind, is_ordering};
use serde_json::json;

/// Keep only the selected object ids. An empty selection passes nothing.
pub(crate) fn filter(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let input = def.inputs.first().map_or("input", |p| p.id.as_str());
    let selected: BTreeSet<String> = ctx
        .resolve_field(&node.id, &FieldKey::property("selectedObjectIds"), None)?
        .and_then(|r| r.value.as_array().cloned())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect();

    let incoming = inbound.stream(input);
    let kept: Vec<_> = incoming
        .iter()
        .filter(|o| selected.contains(&o.id))
        .cloned()
        .map(|mut o| {
            Arc::make_mut(&mut o).visit(&node.id);
            o
        })
        .collect();

    ctx.push_log(
        &node.id,
        LogAction::StreamFiltered,
        json!({ "received": ids(&incoming), "kept": ids(&kept) }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Objects(kept),
    ))
}

/// Combine prioritized inputs by object id. The lowest-indexed input holding an id supplies
/// the object; later inputs only fill fields it leaves unset.
pub(crate) fn merge(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let mut merged: Vec<Arc<SceneObject>> = Vec::new();
    let mut position = HashMap::<String, usize>::new();
    let mut sources = Vec::new();

    for port in &def.inputs {
        for obj in inbound.stream(&port.id) {
            sources.push(json!({ "port": port.id, "id": obj.id }));
            match position.get(&obj.id) {
                Some(&i) => Arc::make_mut(&mut merged[i]).merge_missing_from(&obj),
                None => {
                    position.insert(obj.id.clone(), merged.len());
                    merged.push(obj);
                }
            }
        }
    }
    for obj in &mut merged {
        Arc::make_mut(obj).visit(&node.id);
    }

    ctx.push_log(
        &node.id,
        LogAction::StreamsMerged,
        json!({ "inputs": sources, "output": ids(&merged) }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Objects(merged),
    ))
}

/// Connected scalar input first, otherwise the resolved property of the same name.
fn operand(
    ctx: &ExecutionContext<'_>,
    node: &Node,
    inbound: &Inbound,
    port: &str,
) -> FlowResult<Option<Value>> {
    if let Some(v) = inbound.scalar(port) {
        return Ok(Some(v.clone()));
    }
    Ok(ctx
        .resolve_field(&node.id, &FieldKey::property(port), None)?
        .map(|r| r.value))
}

fn operator(ctx: &ExecutionContext<'_>, node: &Node) -> FlowResult<String> {
    Ok(ctx
        .resolve_field(&node.id, &FieldKey::property("operator"), None)?
        .and_then(|r| r.value.as_str().map(str::to_owned))
        .unwrap_or_default())
}

/// Report a failed scalar operation. The node then produces nothing, so bindings on it fall
/// through to the next tier.
fn fail(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    code: IssueCode,
    message: String,
) -> FlowResult<NodeOutput> {
    ctx.push_log(
        &node.id,
        LogAction::OperationFailed,
        json!({ "code": code, "message": message }),
    );
    ctx.push_issue(
        Issue::error(code, format!("{}: {message}", node.display_name())).at_node(&node.id),
    );
    Ok(NodeOutput::default())
}

fn scalar_out(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inputs: Value,
    value: Value,
) -> FlowResult<NodeOutput> {
    ctx.push_log(
        &node.id,
        LogAction::ScalarComputed,
        json!({ "inputs": inputs, "value": value }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Scalar(value),
    ))
}

pub(crate) fn compare(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let op = operator(ctx, node)?;
    let a = operand(ctx, node, inbound, "a")?.unwrap_or(Value::Null);
    let b = operand(ctx, node, inbound, "b")?.unwrap_or(Value::Null);

    let result = if is_ordering(&op) {
        let ord = match (&a, &b) {
            (Value::Number(x), Value::Number(y)) => x
                .as_f64()
                .zip(y.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y)),
            (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
            _ => None,
        };
        let Some(ord) = ord else {
            let msg = format!(
                "operator '{op}' cannot order {:?} and {:?}",
                OperandKind::of_value(&a),
                OperandKind::of_value(&b)
            );
            return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
        };
        match op.as_str() {
            "gt" => ord.is_gt(),
            "gte" => ord.is_ge(),
            "lt" => ord.is_lt(),
            _ => ord.is_le(),
        }
    } else {
        if !matches!(op.as_str(), "eq" | "neq") {
            let msg = format!("unknown compare operator '{op}'");
            return fail(ctx, node, IssueCode::InvalidOperator, msg);
        }
        let (ka, kb) = (OperandKind::of_value(&a), OperandKind::of_value(&b));
        if ka != kb {
            let msg = format!("operator '{op}' cannot compare {ka:?} with {kb:?}");
            return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
        }
        let equal = match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        };
        if op == "eq" { equal } else { !equal }
    };
    scalar_out(
        ctx,
        node,
        def,
        json!({ "operator": op, "a": a, "b": b }),
        Value::Bool(result),
    )
}

pub(crate) fn boolean_op(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let op = operator(ctx, node)?;
    let a = operand(ctx, node, inbound, "a")?.unwrap_or(Value::Null);
    let b = operand(ctx, node, inbound, "b")?.unwrap_or(Value::Null);

    let Some(x) = a.as_bool() else {
        let msg = format!("operand 'a' must be a boolean, got {a}");
        return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
    };
    if op == "not" {
        return scalar_out(ctx, node, def, json!({ "operator": op, "a": a }), Value::Bool(!x));
    }
    let Some(y) = b.as_bool() else {
        let msg = format!("operand 'b' must be a boolean, got {b}");
        return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
    };
    let result = match op.as_str() {
        "and" => x && y,
        "or" => x || y,
        "xor" => x ^ y,
        _ => {
            let msg = format!("unknown boolean operator '{op}'");
            return fail(ctx, node, IssueCode::InvalidOperator, msg);
        }
    };
    scalar_out(
        ctx,
        node,
        def,
        json!({ "operator": op, "a": a, "b": b }),
        Value::Bool(result),
    )
}

pub(crate) fn math_op(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let op = operator(ctx, node)?;
    let a = operand(ctx, node, inbound, "a")?.unwrap_or(Value::Null);
    let b = operand(ctx, node, inbound, "b")?.unwrap_or(Value::Null);

    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        let msg = format!("operands must be numbers, got {a} and {b}");
        return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
    };
    if matches!(op.as_str(), "divide" | "modulo") && y == 0.0 {
        let msg = format!("{op} by zero");
        return fail(ctx, node, IssueCode::DivisionByZero, msg);
    }
    let result = match op.as_str() {
        "add" => x + y,
        "subtract" => x - y,
        "multiply" => x * y,
        "divide" => x / y,
        "modulo" => x % y,
        "power" => x.powf(y),
        "min" => x.min(y),
        "max" => x.max(y),
        _ => {
            let msg = format!("unknown math operator '{op}'");
            return fail(ctx, node, IssueCode::InvalidOperator, msg);
        }
    };
    if !result.is_finite() {
        let msg = format!("{op} of {x} and {y} is not a finite number");
        return fail(ctx, node, IssueCode::NonFiniteResult, msg);
    }
    scalar_out(
        ctx,
        node,
        def,
        json!({ "operator": op, "a": a, "b": b }),
        json!(result),
    )
}

/// Route the input to the `true` or `false` port.
pub(crate) fn if_else(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let cond = operand(ctx, node, inbound, "condition")?.unwrap_or(Value::Null);
    let Some(branch) = cond.as_bool() else {
        let msg = format!("condition must be a boolean, got {cond}");
        return fail(ctx, node, IssueCode::OperandTypeMismatch, msg);
    };
    let port = if branch { "true" } else { "false" };

    let mut out = NodeOutput::default();
    let routed = inbound.first("input").map(|v| match v {
        PortValue::Objects(objs) => PortValue::Objects(
            objs.iter()
                .cloned()
                .map(|mut o| {
                    Arc::make_mut(&mut o).visit(&node.id);
                    o
                })
                .collect(),
        ),
        other => other.clone(),
    });
    if let Some(v) = routed {
        out.ports.insert(port.to_owned(), v);
    }
    ctx.push_log(
        &node.id,
        LogAction::BranchSelected,
        json!({ "condition": branch, "port": port }),
    );
    Ok(out)
}

pub(crate) fn constant(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
) -> FlowResult<NodeOutput> {
    let value = ctx
        .resolve_field(&node.id, &FieldKey::property("value"), None)?
        .map_or(Value::Null, |r| r.value);
    ctx.push_log(
        &node.id,
        LogAction::ConstantEmitted,
        json!({ "value": value }),
    );
    Ok(NodeOutput::single(
        primary_output(def),
        PortValue::Scalar(value),
    ))
}

/// Expose the inbound value to bindings and to the debugger.
pub(crate) fn result(
    ctx: &mut ExecutionContext<'_>,
    node: &Node,
    def: &NodeDefinition,
    inbound: &Inbound,
) -> FlowResult<NodeOutput> {
    let input = def.inputs.first().map_or("input", |p| p.id.as_str());
    let value = inbound.first(input).cloned();
    ctx.push_log(
        &node.id,
        LogAction::ResultOutput,
        json!({
            "displayName": node.display_name(),
            "value": value.as_ref().map_or(Value::Null, PortValue::snapshot),
        }),
    );
    Ok(match value {
        Some(v) => NodeOutput::single(primary_output(def), v),
        None => NodeOutput::default(),
    })
}

#[cfg(test)]
#[path = "../../../tests/unit/eval/executors/logic.rs"]
mod tests;
