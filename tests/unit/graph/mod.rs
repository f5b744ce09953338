use super::*;
use crate::normalize::defs::FlowDocument;
use crate::normalize::pass::{NormalizedFlow, normalize_flow};
use crate::registry::Registries;
use serde_json::json;

fn flow(nodes: &[(&str, &str)], edges: &[(&str, &str)]) -> NormalizedFlow {
    let doc: FlowDocument = serde_json::from_value(json!({
        "nodes": nodes.iter().map(|(id, ty)| json!({ "id": id, "type": ty })).collect::<Vec<_>>(),
        "edges": edges.iter().map(|(s, t)| json!({ "source": s, "target": t })).collect::<Vec<_>>(),
    }))
    .unwrap();
    normalize_flow(&doc, &Registries::builtin()).unwrap()
}

fn ids(g: &FlowGraph<'_>, order: impl IntoIterator<Item = usize>) -> Vec<String> {
    order.into_iter().map(|i| g.node(i).id.clone()).collect()
}

#[test]
fn kahn_order_respects_edges_and_input_order() {
    let f = flow(
        &[("s", "scene"), ("a", "animation"), ("r", "rectangle"), ("c", "circle")],
        &[("r", "a"), ("a", "s"), ("c", "s")],
    );
    let g = FlowGraph::new(&f.nodes, &f.edges);
    let order = g.topological_order().unwrap();
    assert_eq!(ids(&g, order), ["r", "a", "c", "s"]);
}

#[test]
fn cycle_anywhere_is_reported() {
    let f = flow(
        &[("r", "rectangle"), ("s", "scene"), ("f1", "filter"), ("f2", "filter")],
        &[("r", "s"), ("f1", "f2"), ("f2", "f1")],
    );
    let g = FlowGraph::new(&f.nodes, &f.edges);
    match g.topological_order() {
        Err(FlowError::Cycle { nodes }) => assert_eq!(nodes, ["f1", "f2"]),
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn ancestors_follow_edges_upstream() {
    let f = flow(
        &[("r", "rectangle"), ("a", "animation"), ("s", "scene"), ("c", "circle")],
        &[("r", "a"), ("a", "s")],
    );
    let g = FlowGraph::new(&f.nodes, &f.edges);
    let s = g.index_of("s").unwrap();
    assert_eq!(ids(&g, g.ancestors(s)), ["r", "a"]);
    assert_eq!(ids(&g, g.edge_ancestors(s)), ["r", "a"]);
    assert!(g.ancestors(g.index_of("c").unwrap()).is_empty());
}

fn bound_flow(box_first: bool) -> NormalizedFlow {
    let boxed = json!({ "id": "box", "type": "rectangle", "data": { "variableBindings": { "width": "size" } } });
    let mut nodes = vec![
        json!({ "id": "k", "type": "constant" }),
        json!({ "id": "size", "type": "result" }),
        json!({ "id": "s", "type": "scene" }),
    ];
    if box_first {
        nodes.insert(0, boxed);
    } else {
        nodes.push(boxed);
    }
    let doc: FlowDocument = serde_json::from_value(json!({
        "nodes": nodes,
        "edges": [{ "source": "k", "target": "size" }, { "source": "box", "target": "s" }],
    }))
    .unwrap();
    normalize_flow(&doc, &Registries::builtin()).unwrap()
}

#[test]
fn bound_result_runs_before_the_binding_node_in_any_listing() {
    for box_first in [true, false] {
        let f = bound_flow(box_first);
        let g = FlowGraph::new(&f.nodes, &f.edges);
        let order = ids(&g, g.topological_order().unwrap());
        let pos = |id: &str| order.iter().position(|o| o == id).unwrap();
        assert!(pos("k") < pos("size"), "{order:?}");
        assert!(pos("size") < pos("box"), "{order:?}");
        assert!(pos("box") < pos("s"), "{order:?}");

        let b = g.index_of("box").unwrap();
        assert_eq!(ids(&g, g.ancestors(b)), ["k", "size"]);
        assert!(g.edge_ancestors(b).is_empty());
    }
}

#[test]
fn binding_back_into_own_input_is_a_cycle() {
    let doc: FlowDocument = serde_json::from_value(json!({
        "nodes": [
            { "id": "r", "type": "rectangle", "data": { "variableBindings": { "width": "res" } } },
            { "id": "res", "type": "result" },
            { "id": "s", "type": "scene" }
        ],
        "edges": [{ "source": "r", "target": "res" }, { "source": "r", "target": "s" }],
    }))
    .unwrap();
    let f = normalize_flow(&doc, &Registries::builtin()).unwrap();
    let g = FlowGraph::new(&f.nodes, &f.edges);
    match g.topological_order() {
        Err(FlowError::Cycle { nodes }) => {
            assert!(nodes.contains(&"r".to_owned()));
            assert!(nodes.contains(&"res".to_owned()));
        }
        other => panic!("expected cycle, got {other:?}"),
    }
}

#[test]
fn dangling_edges_are_ignored() {
    let f = flow(&[("r", "rectangle")], &[("r", "ghost")]);
    let g = FlowGraph::new(&f.nodes, &f.edges);
    assert_eq!(g.outgoing(0).count(), 0);
    assert_eq!(g.topological_order().unwrap(), [0]);
}
