use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::animation::track::TrackSpec;
use crate::foundation::core::{ObjectId, ValueMap};
use crate::foundation::error::{FlowError, FlowResult};
use crate::model::flow::{Binding, ObjectAssignment};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// JSON-facing flow document as produced by the editor.
///
/// Loosely typed on purpose: missing data is filled during normalization, not rejected here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDocument {
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

impl FlowDocument {
    /// Parse a flow document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FlowResult<Self> {
        serde_json::from_reader(r).map_err(|e| FlowError::serde(format!("parse flow JSON: {e}")))
    }

    pub fn from_json(json: &str) -> FlowResult<Self> {
        Self::from_reader(json.as_bytes())
    }

    /// Parse a flow document from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlowError::invalid(format!("open flow JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDef {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub data: NodeDataDef,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDataDef {
    #[serde(default)]
    pub identifier: Option<IdentifierDef>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub properties: ValueMap,
    #[serde(default)]
    pub per_object_assignments: BTreeMap<ObjectId, ObjectAssignment>,
    #[serde(default)]
    pub variable_bindings: BTreeMap<String, BindingDef>,
    #[serde(default)]
    pub per_object_bindings: BTreeMap<ObjectId, BTreeMap<String, BindingDef>>,
    #[serde(default)]
    pub tracks: Vec<TrackSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifierDef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A binding written either as the bound node id or as `{ "boundResultNodeId": .. }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BindingDef(pub Binding);

impl<'de> Deserialize<'de> for BindingDef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Id(String),
            Obj(Binding),
        }

        Ok(Self(match Repr::deserialize(deserializer)? {
            Repr::Id(bound_result_node_id) => Binding {
                bound_result_node_id,
            },
            Repr::Obj(b) => b,
        }))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
    #[serde(default)]
    pub id: Option<String>,
    pub source: String,
    #[serde(default)]
    pub source_handle: Option<String>,
    pub target: String,
    #[serde(default)]
    pub target_handle: Option<String>,
}
