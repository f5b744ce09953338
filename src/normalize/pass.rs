use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::animation::track::TrackSpec;
use crate::foundation::core::{NodeId, Value, ValueMap};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::FlowGraph;
use crate::model::flow::{Edge, Identifier, Lineage, Node, NodeData, VariableBindings};
use crate::normalize::defs::{BindingDef, EdgeDef, FlowDocument, NodeDef};
use crate::registry::Registries;
use crate::registry::nodes::{NodeDefinition, PropertySchema};
use chrono::{DateTime, Utc};

/// Mapping from editor-side node ids to normalized node ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct IdMap(BTreeMap<String, NodeId>);

impl IdMap {
    pub fn get(&self, external: &str) -> Option<&NodeId> {
        self.0.get(external)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn resolve(&self, external: &str) -> NodeId {
        self.get(external).cloned().unwrap_or_else(|| external.to_owned())
    }
}

/// Engine-ready flow.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NormalizedFlow {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub id_map: IdMap,
}

/// Normalize an editor document against the registries.
///
/// Node data is merged over registry defaults, identifiers and display names are assigned,
/// edge handles and port types are filled in and lineage is computed. An unknown node type is
/// fatal; every other oddity is left for the validators to report.
#[tracing::instrument(skip_all, fields(nodes = doc.nodes.len(), edges = doc.edges.len()))]
pub fn normalize_flow(doc: &FlowDocument, registries: &Registries) -> FlowResult<NormalizedFlow> {
    let now = Utc::now();
    let mut sequences = HashMap::<&str, u32>::new();
    let mut taken = HashSet::<NodeId>::new();
    let mut id_map = BTreeMap::<String, NodeId>::new();
    let mut defs_by_id = HashMap::<NodeId, &NodeDefinition>::new();
    let mut nodes = Vec::with_capacity(doc.nodes.len());

    for nd in &doc.nodes {
        let def = registries
            .node_type(&nd.node_type)
            .ok_or_else(|| FlowError::unknown_node_type(&nd.id, &nd.node_type))?;
        let seq = sequences.entry(nd.node_type.as_str()).or_insert(0);
        *seq += 1;

        let id = assign_id(nd, &mut taken);
        if id_map.contains_key(&nd.id) {
            tracing::warn!(external = %nd.id, assigned = %id, "duplicate node id in flow document");
        } else {
            id_map.insert(nd.id.clone(), id.clone());
        }
        defs_by_id.insert(id.clone(), def);
        nodes.push(normalize_node(nd, id, def, *seq, now));
    }

    let id_map = IdMap(id_map);
    for node in &mut nodes {
        remap_references(node, &id_map);
    }
    let edges: Vec<Edge> = doc
        .edges
        .iter()
        .map(|e| normalize_edge(e, &id_map, &defs_by_id))
        .collect();

    fill_lineage(&mut nodes, &edges);
    tracing::debug!(nodes = nodes.len(), edges = edges.len(), "flow normalized");

    Ok(NormalizedFlow {
        nodes,
        edges,
        id_map,
    })
}

/// Prefer the stored identifier, then the editor id, then a numbered variant of the editor id.
fn assign_id(nd: &NodeDef, taken: &mut HashSet<NodeId>) -> NodeId {
    let preferred = nd
        .data
        .identifier
        .as_ref()
        .and_then(|i| i.id.as_deref())
        .filter(|s| !s.is_empty());
    let mut candidates = preferred.into_iter().chain(std::iter::once(nd.id.as_str()));
    let id = candidates
        .find(|c| !taken.contains(*c))
        .map(str::to_owned)
        .unwrap_or_else(|| {
            (2..)
                .map(|n| format!("{}-{n}", nd.id))
                .find(|c| !taken.contains(c))
                .unwrap_or_default()
        });
    taken.insert(id.clone());
    id
}

fn normalize_node(
    nd: &NodeDef,
    id: NodeId,
    def: &NodeDefinition,
    sequence: u32,
    now: DateTime<Utc>,
) -> Node {
    let ident = nd.data.identifier.as_ref();
    let display_name = nd
        .data
        .display_name
        .clone()
        .or_else(|| ident.and_then(|i| i.display_name.clone()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("{} {sequence}", def.label));

    let mut properties = nd.data.properties.clone();
    let defaulted = fill_defaults(&mut properties, &def.properties);

    let bindings = VariableBindings {
        node: unwrap_bindings(&nd.data.variable_bindings),
        per_object: nd
            .data
            .per_object_bindings
            .iter()
            .map(|(o, m)| (o.clone(), unwrap_bindings(m)))
            .collect(),
    };

    Node {
        id: id.clone(),
        node_type: nd.node_type.clone(),
        data: NodeData {
            identifier: Identifier {
                id,
                node_type: nd.node_type.clone(),
                created_at: ident.and_then(|i| i.created_at).unwrap_or(now),
                sequence,
                display_name,
            },
            lineage: Lineage::default(),
            properties,
            defaulted,
            assignments: nd.data.per_object_assignments.clone(),
            bindings,
            tracks: nd.data.tracks.iter().map(hoist_track_properties).collect(),
        },
    }
}

/// Bindings, per-object keys and filter selections name nodes by editor id; point them at the
/// normalized ids.
fn remap_references(node: &mut Node, id_map: &IdMap) {
    let data = &mut node.data;
    for b in data.bindings.node.values_mut() {
        b.bound_result_node_id = id_map.resolve(&b.bound_result_node_id);
    }
    data.bindings.per_object = std::mem::take(&mut data.bindings.per_object)
        .into_iter()
        .map(|(object, mut fields)| {
            for b in fields.values_mut() {
                b.bound_result_node_id = id_map.resolve(&b.bound_result_node_id);
            }
            (id_map.resolve(&object), fields)
        })
        .collect();
    data.assignments = std::mem::take(&mut data.assignments)
        .into_iter()
        .map(|(object, a)| (id_map.resolve(&object), a))
        .collect();
    if let Some(Value::Array(selected)) = data.properties.get_mut("selectedObjectIds") {
        for v in selected.iter_mut() {
            let Some(s) = v.as_str() else {
                continue;
            };
            let id = id_map.resolve(s);
            *v = Value::String(id);
        }
    }
}

fn unwrap_bindings(m: &BTreeMap<String, BindingDef>) -> BTreeMap<String, crate::model::flow::Binding> {
    m.iter().map(|(k, b)| (k.clone(), b.0.clone())).collect()
}

/// Fill missing or null properties from the schema defaults, one level deep into object
/// defaults, and return the dotted paths that were filled.
fn fill_defaults(props: &mut ValueMap, schemas: &[PropertySchema]) -> BTreeSet<String> {
    let mut filled = BTreeSet::new();
    for schema in schemas {
        match props.get_mut(&schema.key) {
            None | Some(Value::Null) => {
                props.insert(schema.key.clone(), schema.default.clone());
                filled.insert(schema.key.clone());
            }
            Some(Value::Object(current)) => {
                let Value::Object(default) = &schema.default else {
                    continue;
                };
                for (k, v) in default {
                    if current.get(k).is_none_or(Value::is_null) {
                        current.insert(k.clone(), v.clone());
                        filled.insert(format!("{}.{k}", schema.key));
                    }
                }
            }
            Some(_) => {}
        }
    }
    filled
}

/// Editors may nest type-specific track fields under `properties`; flatten them so every
/// track field is addressed the same way.
fn hoist_track_properties(spec: &TrackSpec) -> TrackSpec {
    let mut out = spec.clone();
    if let Some(Value::Object(nested)) = out.fields.remove("properties") {
        for (k, v) in nested {
            out.fields.entry(k).or_insert(v);
        }
    }
    out
}

fn normalize_edge(
    e: &EdgeDef,
    id_map: &IdMap,
    defs: &HashMap<NodeId, &NodeDefinition>,
) -> Edge {
    let source = id_map.resolve(&e.source);
    let target = id_map.resolve(&e.target);
    let source_def = defs.get(&source);
    let target_def = defs.get(&target);

    let source_port = e
        .source_handle
        .clone()
        .or_else(|| source_def.and_then(|d| d.outputs.first()).map(|p| p.id.clone()))
        .unwrap_or_else(|| "output".to_owned());
    let target_port = e
        .target_handle
        .clone()
        .or_else(|| target_def.and_then(|d| d.inputs.first()).map(|p| p.id.clone()))
        .unwrap_or_else(|| "input".to_owned());

    let source_port_type = source_def
        .and_then(|d| d.output(&source_port))
        .map(|p| p.port_type);
    let target_port_type = target_def
        .and_then(|d| d.input(&target_port))
        .map(|p| p.port_type);

    let id = e
        .id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| format!("{source}:{source_port}->{target}:{target_port}"));

    Edge {
        id,
        source_node_id: source,
        source_port_id: source_port,
        source_port_type,
        target_node_id: target,
        target_port_id: target_port,
        target_port_type,
    }
}

fn fill_lineage(nodes: &mut [Node], edges: &[Edge]) {
    let lineages: Vec<Lineage> = {
        let graph = FlowGraph::new(nodes, edges);
        let rank: HashMap<usize, usize> = match graph.topological_order() {
            Ok(order) => order.into_iter().enumerate().map(|(r, i)| (i, r)).collect(),
            Err(_) => (0..graph.len()).map(|i| (i, i)).collect(),
        };
        (0..graph.len())
            .map(|i| {
                let mut parents = Vec::new();
                for e in graph.incoming(i) {
                    if !parents.contains(&e.source_node_id) {
                        parents.push(e.source_node_id.clone());
                    }
                }
                let mut children = Vec::new();
                for e in graph.outgoing(i) {
                    if !children.contains(&e.target_node_id) {
                        children.push(e.target_node_id.clone());
                    }
                }
                let mut ancestors: Vec<usize> =
                    graph.edge_ancestors(i).into_iter().filter(|&a| a != i).collect();
                ancestors.sort_by_key(|a| rank.get(a).copied().unwrap_or(usize::MAX));
                Lineage {
                    parent_nodes: parents,
                    child_nodes: children,
                    flow_path: ancestors.into_iter().map(|a| graph.node(a).id.clone()).collect(),
                }
            })
            .collect()
    };
    for (node, lineage) in nodes.iter_mut().zip(lineages) {
        node.data.lineage = lineage;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/normalize/pass.rs"]
mod tests;
