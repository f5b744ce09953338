use std::collections::{BTreeMap, BTreeSet};
use std::iter::Chain;
use std::option;

use crate::animation::track::TrackSpec;
use crate::foundation::core::{EdgeId, NodeId, ObjectId, PortId, TrackId, Value, ValueMap};
use crate::registry::ports::PortType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable identity of a node plus its user-editable name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub created_at: DateTime<Utc>,
    /// 1-based position among nodes of the same type.
    pub sequence: u32,
    pub display_name: String,
}

/// Provenance of a node within the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineage {
    pub parent_nodes: Vec<NodeId>,
    pub child_nodes: Vec<NodeId>,
    /// Every ancestor, in topological order.
    pub flow_path: Vec<NodeId>,
}

/// Static overrides scoped to one object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectAssignment {
    #[serde(default)]
    pub initial: ValueMap,
    #[serde(default)]
    pub track_overrides: BTreeMap<TrackId, ValueMap>,
}

/// Live reference from a field to the value produced by a result node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub bound_result_node_id: NodeId,
}

/// Field bindings keyed by field key (`"position.x"`, `"track:t1:from.x"`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableBindings {
    #[serde(default)]
    pub node: BTreeMap<String, Binding>,
    #[serde(default)]
    pub per_object: BTreeMap<ObjectId, BTreeMap<String, Binding>>,
}

impl VariableBindings {
    pub fn is_empty(&self) -> bool {
        self.node.is_empty() && self.per_object.values().all(BTreeMap::is_empty)
    }

    /// Bindings for `key`, most specific first: the object's own, then the node-level one.
    pub fn lookup(
        &self,
        key: &str,
        object_id: Option<&str>,
    ) -> Chain<option::IntoIter<&Binding>, option::IntoIter<&Binding>> {
        object_id
            .and_then(|o| self.per_object.get(o))
            .and_then(|m| m.get(key))
            .into_iter()
            .chain(self.node.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Option<&ObjectId>, &String, &Binding)> {
        self.node.iter().map(|(k, b)| (None, k, b)).chain(
            self.per_object
                .iter()
                .flat_map(|(o, m)| m.iter().map(move |(k, b)| (Some(o), k, b))),
        )
    }
}

/// Normalized node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub identifier: Identifier,
    #[serde(default)]
    pub lineage: Lineage,
    /// User values merged over the registry defaults.
    #[serde(default)]
    pub properties: ValueMap,
    /// Dotted paths in `properties` that were filled from registry defaults.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub defaulted: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub assignments: BTreeMap<ObjectId, ObjectAssignment>,
    #[serde(default, skip_serializing_if = "VariableBindings::is_empty")]
    pub bindings: VariableBindings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracks: Vec<TrackSpec>,
}

impl NodeData {
    /// The node's own value at `path`, ignoring anything that came from registry defaults.
    pub fn stored_value(&self, path: &str) -> Option<&Value> {
        if self.is_defaulted(path) {
            return None;
        }
        crate::foundation::core::lookup_in_map(&self.properties, path)
    }

    fn is_defaulted(&self, path: &str) -> bool {
        if self.defaulted.contains(path) {
            return true;
        }
        path.match_indices('.')
            .any(|(i, _)| self.defaulted.contains(&path[..i]))
    }

    pub fn track(&self, identifier: &str) -> Option<&TrackSpec> {
        self.tracks.iter().find(|t| t.identifier == identifier)
    }
}

/// A typed node instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    pub data: NodeData,
}

impl Node {
    pub fn display_name(&self) -> &str {
        &self.data.identifier.display_name
    }
}

/// Directed connection from an output port to an input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source_node_id: NodeId,
    pub source_port_id: PortId,
    /// `None` when the source port is unknown to the registry.
    pub source_port_type: Option<PortType>,
    pub target_node_id: NodeId,
    pub target_port_id: PortId,
    pub target_port_type: Option<PortType>,
}

impl Edge {
    /// Whether values may flow along this edge.
    pub fn is_traversable(&self) -> bool {
        match (self.source_port_type, self.target_port_type) {
            (Some(s), Some(t)) => s.can_connect_to(t),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/flow.rs"]
mod tests;
