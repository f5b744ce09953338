use super::*;
use crate::eval::engine::{ExecuteOptions, execute_flow};
use crate::normalize::pass::{NormalizedFlow, normalize_flow};
use crate::registry::Registries;

fn flow(v: Value) -> NormalizedFlow {
    normalize_flow(&serde_json::from_value(v).unwrap(), &Registries::builtin()).unwrap()
}

fn scalar<'c>(ctx: &'c ExecutionContext<'_>, node: &str, port: &str) -> Option<&'c Value> {
    ctx.output(node)?.get(port)?.as_scalar()
}

fn stream_ids(ctx: &ExecutionContext<'_>, node: &str, port: &str) -> Vec<String> {
    ctx.output(node)
        .and_then(|o| o.get(port))
        .and_then(PortValue::as_objects)
        .map(|objs| objs.iter().map(|o| o.id.clone()).collect())
        .unwrap_or_default()
}

fn op_flow(node_type: &str, operator: &str, a: Value, b: Value) -> NormalizedFlow {
    flow(json!({ "nodes": [
        { "id": "op", "type": node_type, "data": { "properties": {
            "operator": operator, "a": a, "b": b
        } } }
    ] }))
}

fn eval_op(node_type: &str, operator: &str, a: Value, b: Value) -> Option<Value> {
    let reg = Registries::builtin();
    let f = op_flow(node_type, operator, a, b);
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
    scalar(&ctx, "op", "result").cloned()
}

fn two_shapes_into(extra: Value, edges: Value) -> NormalizedFlow {
    let mut nodes = vec![
        json!({ "id": "a", "type": "rectangle" }),
        json!({ "id": "b", "type": "circle" }),
    ];
    nodes.extend(extra.as_array().cloned().unwrap_or_default());
    flow(json!({ "nodes": nodes, "edges": edges }))
}

#[test]
fn filter_keeps_selected_ids_only() {
    let reg = Registries::builtin();
    let f = two_shapes_into(
        json!([
            { "id": "m", "type": "merge" },
            { "id": "f", "type": "filter", "data": { "properties": { "selectedObjectIds": ["b"] } } }
        ]),
        json!([
            { "source": "a", "target": "m", "targetHandle": "input1" },
            { "source": "b", "target": "m", "targetHandle": "input2" },
            { "source": "m", "target": "f" }
        ]),
    );
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    assert_eq!(stream_ids(&ctx, "f", "output"), ["b"]);
    let entry = ctx.log().iter().find(|e| e.node_id == "f").unwrap();
    assert_eq!(entry.action, LogAction::StreamFiltered);
    assert_eq!(entry.data["received"], json!(["a", "b"]));
}

#[test]
fn empty_selection_passes_nothing() {
    let reg = Registries::builtin();
    let f = two_shapes_into(
        json!([{ "id": "f", "type": "filter" }]),
        json!([{ "source": "a", "target": "f" }]),
    );
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
    assert!(stream_ids(&ctx, "f", "output").is_empty());
}

#[test]
fn merge_prefers_lower_ports_and_fills_gaps() {
    let reg = Registries::builtin();
    // input1 carries the bare rectangle, input2 the same object after an insert
    let f = two_shapes_into(
        json!([
            { "id": "ins", "type": "insert", "data": { "properties": { "appearanceTime": 2 } } },
            { "id": "m", "type": "merge" }
        ]),
        json!([
            { "source": "a", "target": "ins" },
            { "source": "a", "target": "m", "targetHandle": "input1" },
            { "source": "ins", "target": "m", "targetHandle": "input2" },
            { "source": "b", "target": "m", "targetHandle": "input3" }
        ]),
    );
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    assert_eq!(stream_ids(&ctx, "m", "output"), ["a", "b"]);
    let out = ctx.output("m").unwrap().get("output").unwrap();
    let a = &out.as_objects().unwrap()[0];
    assert_eq!(a.appearance_time, Some(2.0));
    assert!(a.lineage.path.contains(&"ins".to_owned()));
    assert_eq!(a.lineage.path.last().map(String::as_str), Some("m"));
}

#[test]
fn compare_orders_numbers_and_strings() {
    assert_eq!(eval_op("compare", "gt", json!(3), json!(2)), Some(json!(true)));
    assert_eq!(eval_op("compare", "lte", json!(3), json!(2)), Some(json!(false)));
    assert_eq!(eval_op("compare", "lt", json!("a"), json!("b")), Some(json!(true)));
    assert_eq!(eval_op("compare", "eq", json!(2), json!(2.0)), Some(json!(true)));
    assert_eq!(eval_op("compare", "neq", json!("x"), json!("x")), Some(json!(false)));
}

#[test]
fn compare_mismatch_fails_without_output() {
    let reg = Registries::builtin();
    let f = op_flow("compare", "gt", json!(1), json!("one"));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    assert!(ctx.output("op").unwrap().is_empty());
    assert!(ctx.log().iter().any(|e| e.action == LogAction::OperationFailed));
    assert!(
        ctx.issues()
            .iter()
            .any(|i| i.code == IssueCode::OperandTypeMismatch && i.node_id.as_deref() == Some("op"))
    );
}

#[test]
fn equality_across_kinds_is_a_mismatch() {
    let reg = Registries::builtin();
    for operator in ["eq", "neq"] {
        let f = op_flow("compare", operator, json!(1), json!("1"));
        let ctx =
            execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
        assert!(scalar(&ctx, "op", "result").is_none());
        assert!(ctx.issues().iter().any(|i| i.code == IssueCode::OperandTypeMismatch));
    }
}

#[test]
fn boolean_ops_including_not() {
    assert_eq!(eval_op("boolean_op", "and", json!(true), json!(false)), Some(json!(false)));
    assert_eq!(eval_op("boolean_op", "or", json!(true), json!(false)), Some(json!(true)));
    assert_eq!(eval_op("boolean_op", "xor", json!(true), json!(true)), Some(json!(false)));
    assert_eq!(eval_op("boolean_op", "not", json!(true), json!(null)), Some(json!(false)));
}

#[test]
fn math_ops_and_division_by_zero() {
    assert_eq!(eval_op("math_op", "add", json!(2), json!(3)), Some(json!(5.0)));
    assert_eq!(eval_op("math_op", "power", json!(2), json!(3)), Some(json!(8.0)));
    assert_eq!(eval_op("math_op", "modulo", json!(7), json!(4)), Some(json!(3.0)));
    assert_eq!(eval_op("math_op", "max", json!(-1), json!(4)), Some(json!(4.0)));

    let reg = Registries::builtin();
    let f = op_flow("math_op", "divide", json!(1), json!(0));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
    assert!(scalar(&ctx, "op", "result").is_none());
    assert!(ctx.issues().iter().any(|i| i.code == IssueCode::DivisionByZero));
}

#[test]
fn non_finite_results_fail() {
    let reg = Registries::builtin();
    for (operator, a, b) in [("power", json!(-8), json!(0.5)), ("multiply", json!(1e308), json!(10))] {
        let f = op_flow("math_op", operator, a, b);
        let ctx =
            execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
        assert!(scalar(&ctx, "op", "result").is_none(), "{operator}");
        assert!(ctx.issues().iter().any(|i| i.code == IssueCode::NonFiniteResult));
        assert!(!ctx.log().iter().any(|e| e.action == LogAction::ScalarComputed));
    }
}

#[test]
fn unknown_operator_is_reported() {
    assert_eq!(eval_op("math_op", "root", json!(4), json!(2)), None);
}

#[test]
fn connected_scalar_beats_property() {
    let reg = Registries::builtin();
    let f = flow(json!({
        "nodes": [
            { "id": "k", "type": "constant", "data": { "properties": { "value": 10 } } },
            { "id": "op", "type": "math_op", "data": { "properties": {
                "operator": "multiply", "a": 1, "b": 3
            } } }
        ],
        "edges": [{ "source": "k", "target": "op", "targetHandle": "a" }]
    }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
    assert_eq!(scalar(&ctx, "op", "result"), Some(&json!(30.0)));
    assert_eq!(scalar(&ctx, "k", "value"), Some(&json!(10)));
}

#[test]
fn if_else_routes_stream_to_selected_port() {
    let reg = Registries::builtin();
    let f = flow(json!({
        "nodes": [
            { "id": "k", "type": "constant", "data": { "properties": { "value": false } } },
            { "id": "r", "type": "rectangle" },
            { "id": "br", "type": "if_else" }
        ],
        "edges": [
            { "source": "k", "target": "br", "targetHandle": "condition" },
            { "source": "r", "target": "br", "targetHandle": "input" }
        ]
    }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    assert_eq!(stream_ids(&ctx, "br", "false"), ["r"]);
    assert!(ctx.output("br").unwrap().get("true").is_none());
    let entry = ctx.log().iter().find(|e| e.node_id == "br").unwrap();
    assert_eq!(entry.action, LogAction::BranchSelected);
    assert_eq!(entry.data["port"], json!("false"));
}

#[test]
fn result_node_exposes_value_to_bindings() {
    let reg = Registries::builtin();
    let f = flow(json!({
        "nodes": [
            { "id": "op", "type": "math_op", "data": { "properties": {
                "operator": "add", "a": 100, "b": 20
            } } },
            { "id": "res", "type": "result", "data": { "displayName": "Width" } },
            { "id": "r", "type": "rectangle", "data": {
                "properties": { "width": 5 },
                "variableBindings": { "width": "res" }
            } }
        ],
        "edges": [{ "source": "op", "target": "res" }]
    }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();

    assert_eq!(ctx.object("r").unwrap().properties["width"], json!(120.0));
    let results: Vec<_> = ctx.results().collect();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].data["displayName"], json!("Width"));
}

#[test]
fn failed_operation_lets_bindings_fall_through() {
    let reg = Registries::builtin();
    let f = flow(json!({
        "nodes": [
            { "id": "op", "type": "math_op", "data": { "properties": {
                "operator": "divide", "a": 1, "b": 0
            } } },
            { "id": "res", "type": "result" },
            { "id": "r", "type": "rectangle", "data": {
                "properties": { "width": 5 },
                "variableBindings": { "width": "res" }
            } }
        ],
        "edges": [{ "source": "op", "target": "res" }]
    }));
    let ctx = execute_flow(&f.nodes, &f.edges, &reg, &ExecuteOptions::scene_optional()).unwrap();
    assert_eq!(ctx.object("r").unwrap().properties["width"], json!(5));
}
