use super::*;
use crate::normalize::pass::normalize_flow;
use crate::schema::issue::IssueCode;
use serde_json::json;

#[test]
fn validators_run_cumulatively() {
    let f = normalize_flow(
        &serde_json::from_value(json!({
            "nodes": [
                { "id": "m", "type": "math_op", "data": { "properties": { "a": true } } },
                { "id": "a", "type": "animation" }
            ],
            "edges": [{ "source": "m", "sourceHandle": "result", "target": "a" }]
        }))
        .unwrap(),
        &Registries::builtin(),
    )
    .unwrap();
    let issues = validate_flow(&f.nodes, &f.edges, &Registries::builtin()).unwrap();
    let codes: Vec<_> = issues.iter().map(|i| i.code).collect();
    assert!(codes.contains(&IssueCode::MissingTerminalNode));
    assert!(codes.contains(&IssueCode::IncompatiblePorts));
    assert!(codes.contains(&IssueCode::OperandTypeMismatch));
}

#[test]
fn cycles_are_thrown() {
    let f = normalize_flow(
        &serde_json::from_value(json!({
            "nodes": [
                { "id": "x", "type": "filter" },
                { "id": "y", "type": "filter" },
                { "id": "s", "type": "scene" }
            ],
            "edges": [
                { "source": "x", "target": "y" },
                { "source": "y", "target": "x" },
                { "source": "y", "target": "s" }
            ]
        }))
        .unwrap(),
        &Registries::builtin(),
    )
    .unwrap();
    let err = validate_flow(&f.nodes, &f.edges, &Registries::builtin()).unwrap_err();
    assert_eq!(err.code(), "CYCLE_DETECTED");
}

#[test]
fn unknown_types_in_hand_built_nodes_are_thrown() {
    let f = normalize_flow(
        &serde_json::from_value(json!({ "nodes": [{ "id": "r", "type": "rectangle" }] })).unwrap(),
        &Registries::builtin(),
    )
    .unwrap();
    let mut nodes = f.nodes;
    nodes[0].node_type = "blob".to_owned();
    let err = validate_flow(&nodes, &[], &Registries::builtin()).unwrap_err();
    assert!(matches!(err, FlowError::UnknownNodeType { .. }));
}
