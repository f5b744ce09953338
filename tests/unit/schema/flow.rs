use super::*;
use crate::normalize::pass::{NormalizedFlow, normalize_flow};
use serde_json::json;

fn flow(v: serde_json::Value) -> NormalizedFlow {
    normalize_flow(&serde_json::from_value(v).unwrap(), &Registries::builtin()).unwrap()
}

fn check(f: &NormalizedFlow) -> Vec<Issue> {
    validate_semantics(&FlowGraph::new(&f.nodes, &f.edges), &Registries::builtin())
}

fn codes(issues: &[Issue]) -> Vec<IssueCode> {
    issues.iter().map(|i| i.code).collect()
}

#[test]
fn clean_flow_has_no_issues() {
    let f = flow(json!({
        "nodes": [{ "id": "r", "type": "rectangle" }, { "id": "s", "type": "scene" }],
        "edges": [{ "source": "r", "target": "s" }]
    }));
    assert!(check(&f).is_empty());
}

#[test]
fn disconnected_required_port_and_missing_geometry() {
    let f = flow(json!({ "nodes": [{ "id": "s", "type": "scene" }] }));
    assert_eq!(
        codes(&check(&f)),
        [
            IssueCode::DisconnectedRequiredPort,
            IssueCode::NoGeometryUpstream
        ]
    );
}

#[test]
fn duplicate_display_names_flag_every_extra_node() {
    let f = flow(json!({
        "nodes": [
            { "id": "a", "type": "circle", "data": { "displayName": "Ball" } },
            { "id": "b", "type": "circle", "data": { "displayName": "Ball" } },
            { "id": "s", "type": "scene" }
        ],
        "edges": [{ "source": "a", "target": "s" }, { "source": "b", "target": "s" }]
    }));
    let issues = check(&f);
    assert_eq!(codes(&issues), [IssueCode::DuplicateDisplayName]);
    assert_eq!(issues[0].node_id.as_deref(), Some("b"));
}

#[test]
fn user_values_are_checked_against_constraints_and_types() {
    let f = flow(json!({
        "nodes": [
            { "id": "r", "type": "rectangle", "data": { "properties": { "opacity": 2.0, "width": "wide" } } },
            { "id": "a", "type": "animation", "data": { "tracks": [
                { "identifier": "t", "type": "slide", "direction": "sideways" }
            ] } },
            { "id": "s", "type": "scene" }
        ],
        "edges": [{ "source": "r", "target": "a" }, { "source": "a", "target": "s" }]
    }));
    let issues = check(&f);
    let mut c = codes(&issues);
    c.sort_by_key(|c| c.as_str());
    assert_eq!(
        c,
        [
            IssueCode::ConstraintViolation,
            IssueCode::ConstraintViolation,
            IssueCode::InvalidPropertyType
        ]
    );
    assert!(issues.iter().any(|i| i.message.contains("sideways")));
}

#[test]
fn binding_targets_are_checked() {
    let f = flow(json!({
        "nodes": [
            { "id": "k", "type": "constant", "data": { "properties": { "value": 3 } } },
            { "id": "r", "type": "rectangle", "data": { "variableBindings": {
                "width": "res", "height": "ghost", "rotation": "k", "opacity": "late", "cornerRadius": "idle"
            } } },
            { "id": "res", "type": "result" },
            { "id": "late", "type": "result" },
            { "id": "idle", "type": "result" },
            { "id": "s", "type": "scene" }
        ],
        "edges": [
            { "source": "k", "target": "res" },
            { "source": "res", "sourceHandle": "value", "target": "late" },
            { "source": "r", "target": "s" }
        ]
    }));
    let issues: Vec<_> = check(&f)
        .into_iter()
        .filter(|i| i.node_id.as_deref() == Some("r"))
        .collect();
    let mut c = codes(&issues);
    c.sort_by_key(|c| c.as_str());
    assert_eq!(
        c,
        [
            IssueCode::BindingTargetNotResult,
            IssueCode::UnfedBindingTarget,
            IssueCode::UnknownBindingTarget
        ]
    );
    assert!(issues.iter().any(|i| i.message.contains("Result 3")));
}

#[test]
fn track_binding_keys_must_name_a_track() {
    let f = flow(json!({
        "nodes": [
            { "id": "k", "type": "constant" },
            { "id": "res", "type": "result" },
            { "id": "r", "type": "rectangle" },
            { "id": "a", "type": "animation", "data": {
                "tracks": [{ "identifier": "t1", "type": "fade" }],
                "variableBindings": { "track:t1:to": "res", "track:t9:to": "res" }
            } },
            { "id": "s", "type": "scene" }
        ],
        "edges": [
            { "source": "k", "target": "res" },
            { "source": "r", "target": "a" },
            { "source": "a", "target": "s" }
        ]
    }));
    let issues = check(&f);
    assert_eq!(codes(&issues), [IssueCode::UnknownBindingField]);
    assert!(issues[0].message.contains("t9"));
}
