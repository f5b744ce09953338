//! Four-tier field resolution: live binding, per-object override, node value, registry default.

use std::collections::BTreeMap;
use std::fmt;

use crate::foundation::core::{
    NodeId, ObjectId, TrackId, Value, Vec2, lookup_in_map, lookup_path,
};
use crate::model::flow::{Node, NodeData, ObjectAssignment, VariableBindings};
use crate::registry::Registries;
use crate::registry::nodes::NodeDefinition;
use crate::registry::tracks::TrackRegistry;
use serde::{Deserialize, Serialize};

/// Address of one resolvable field on a node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum FieldKey {
    /// Node property at a dotted path (`"position.x"`).
    Property { path: String },
    /// Field of one animation track (`from.x` of track `t1`).
    Track { track_id: TrackId, path: String },
}

impl FieldKey {
    pub fn property(path: &str) -> Self {
        Self::Property {
            path: path.to_owned(),
        }
    }

    pub fn track(track_id: &str, path: &str) -> Self {
        Self::Track {
            track_id: track_id.to_owned(),
            path: path.to_owned(),
        }
    }

    /// Parse the binding-key spelling: `"path"` or `"track:<id>:<path>"`.
    pub fn parse(s: &str) -> Self {
        if let Some(rest) = s.strip_prefix("track:")
            && let Some((id, path)) = rest.split_once(':')
        {
            return Self::track(id, path);
        }
        Self::property(s)
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Property { path } | Self::Track { path, .. } => path,
        }
    }

    /// Same scope, another path (`"position"` -> `"position.x"`).
    pub fn with_path(&self, path: String) -> Self {
        match self {
            Self::Property { .. } => Self::Property { path },
            Self::Track { track_id, .. } => Self::Track {
                track_id: track_id.clone(),
                path,
            },
        }
    }
}

/// Spelled the way bindings are keyed in node data.
impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Property { path } => f.write_str(path),
            Self::Track { track_id, path } => write!(f, "track:{track_id}:{path}"),
        }
    }
}

/// Which precedence tier supplied a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum Tier {
    Binding { node_id: NodeId },
    Override,
    NodeValue,
    RegistryDefault,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolved {
    pub value: Value,
    #[serde(flatten)]
    pub tier: Tier,
}

impl Resolved {
    pub fn new(value: Value, tier: Tier) -> Self {
        Self { value, tier }
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}

/// One precedence tier.
pub trait FieldSource {
    fn lookup(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Resolved>;
}

/// Values produced so far in the current run, by node id.
pub trait LiveValues {
    fn live_value(&self, node_id: &str) -> Option<&Value>;
}

/// Tier 1. A missing or unproduced binding target falls through to the next binding for the
/// same key, then to the next tier.
pub struct BindingSource<'a, L> {
    pub bindings: &'a VariableBindings,
    pub live: &'a L,
}

impl<L: LiveValues> FieldSource for BindingSource<'_, L> {
    fn lookup(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Resolved> {
        let path = key.path();
        // exact key first, then bindings on an enclosing path (`position` for `position.x`)
        let candidates = std::iter::once((path, "")).chain(
            path.match_indices('.')
                .rev()
                .map(|(i, _)| (&path[..i], &path[i + 1..])),
        );
        for (prefix, rest) in candidates {
            let bkey = key.with_path(prefix.to_owned()).to_string();
            for binding in self.bindings.lookup(&bkey, object_id) {
                let node_id = &binding.bound_result_node_id;
                if let Some(v) = self
                    .live
                    .live_value(node_id)
                    .and_then(|v| lookup_path(v, rest))
                    .filter(|v| !v.is_null())
                {
                    return Some(Resolved::new(
                        v.clone(),
                        Tier::Binding {
                            node_id: node_id.clone(),
                        },
                    ));
                }
            }
        }
        None
    }
}

/// Tier 2. Only consulted when an object id is given.
pub struct OverrideSource<'a> {
    pub assignments: &'a BTreeMap<ObjectId, ObjectAssignment>,
}

impl FieldSource for OverrideSource<'_> {
    fn lookup(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Resolved> {
        let a = self.assignments.get(object_id?)?;
        let v = match key {
            FieldKey::Property { path } => lookup_in_map(&a.initial, path),
            FieldKey::Track { track_id, path } => {
                lookup_in_map(a.track_overrides.get(track_id)?, path)
            }
        }?;
        (!v.is_null()).then(|| Resolved::new(v.clone(), Tier::Override))
    }
}

/// Tier 3. Values the user stored on the node itself.
pub struct NodeValueSource<'a> {
    pub data: &'a NodeData,
}

impl FieldSource for NodeValueSource<'_> {
    fn lookup(&self, key: &FieldKey, _object_id: Option<&str>) -> Option<Resolved> {
        let v = match key {
            FieldKey::Property { path } => self.data.stored_value(path),
            FieldKey::Track { track_id, path } => self.data.track(track_id)?.field(path),
        }?;
        (!v.is_null()).then(|| Resolved::new(v.clone(), Tier::NodeValue))
    }
}

/// Tier 4. Node type and track type schema defaults.
pub struct RegistryDefaultSource<'a> {
    pub def: Option<&'a NodeDefinition>,
    pub tracks: &'a TrackRegistry,
    pub data: &'a NodeData,
}

impl FieldSource for RegistryDefaultSource<'_> {
    fn lookup(&self, key: &FieldKey, _object_id: Option<&str>) -> Option<Resolved> {
        let v = match key {
            FieldKey::Property { path } => self.def?.default_at(path),
            FieldKey::Track { track_id, path } => {
                let kind = self.data.track(track_id)?.kind;
                self.tracks.default_at(kind, path)
            }
        }?;
        Some(Resolved::new(v.clone(), Tier::RegistryDefault))
    }
}

/// Chain of four sources, first match wins. Every field resolves independently.
pub struct FieldResolver<B, O, N, D> {
    pub binding: B,
    pub overrides: O,
    pub node: N,
    pub defaults: D,
}

impl<B, O, N, D> FieldResolver<B, O, N, D>
where
    B: FieldSource,
    O: FieldSource,
    N: FieldSource,
    D: FieldSource,
{
    pub fn resolve(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Resolved> {
        self.binding
            .lookup(key, object_id)
            .or_else(|| self.overrides.lookup(key, object_id))
            .or_else(|| self.node.lookup(key, object_id))
            .or_else(|| self.defaults.lookup(key, object_id))
    }

    pub fn resolve_f64(&self, key: &FieldKey, object_id: Option<&str>) -> Option<f64> {
        self.resolve(key, object_id)?.as_f64()
    }

    /// Resolve a point field axis by axis, so `x` may be bound while `y` is overridden.
    pub fn resolve_point(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Vec2> {
        let axis = |a: &str| {
            let k = key.with_path(format!("{}.{a}", key.path()));
            self.resolve_f64(&k, object_id)
        };
        Some(Vec2::new(axis("x")?, axis("y")?))
    }
}

impl<B, O, N, D> FieldSource for FieldResolver<B, O, N, D>
where
    B: FieldSource,
    O: FieldSource,
    N: FieldSource,
    D: FieldSource,
{
    fn lookup(&self, key: &FieldKey, object_id: Option<&str>) -> Option<Resolved> {
        self.resolve(key, object_id)
    }
}

/// The resolver the engine uses for a node.
pub type NodeResolver<'a, L> = FieldResolver<
    BindingSource<'a, L>,
    OverrideSource<'a>,
    NodeValueSource<'a>,
    RegistryDefaultSource<'a>,
>;

pub fn node_resolver<'a, L: LiveValues>(
    node: &'a Node,
    registries: &'a Registries,
    live: &'a L,
) -> NodeResolver<'a, L> {
    FieldResolver {
        binding: BindingSource {
            bindings: &node.data.bindings,
            live,
        },
        overrides: OverrideSource {
            assignments: &node.data.assignments,
        },
        node: NodeValueSource { data: &node.data },
        defaults: RegistryDefaultSource {
            def: registries.node_type(&node.node_type),
            tracks: &registries.tracks,
            data: &node.data,
        },
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/mod.rs"]
mod tests;
