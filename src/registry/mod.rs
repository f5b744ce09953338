pub mod interp;
pub mod nodes;
pub mod ports;
pub mod tracks;

use crate::foundation::error::FlowResult;
use interp::InterpolatorRegistry;
use nodes::{NodeDefinition, NodeTypeRegistry};
use ports::PortType;
use tracks::TrackRegistry;

/// Immutable lookup tables consumed by every engine operation.
///
/// Built once (usually [`Registries::builtin`]) and passed by reference; nothing in the engine
/// mutates it after construction.
#[derive(Debug, Clone, Default)]
pub struct Registries {
    pub nodes: NodeTypeRegistry,
    pub tracks: TrackRegistry,
    pub interpolators: InterpolatorRegistry,
}

impl Registries {
    pub fn builtin() -> Self {
        Self {
            nodes: NodeTypeRegistry::builtin(),
            tracks: TrackRegistry::builtin(),
            interpolators: InterpolatorRegistry,
        }
    }

    /// Extend the node table with definitions from a JSON array. Entries replace built-ins
    /// of the same type.
    pub fn with_node_types_json(mut self, json: &str) -> FlowResult<Self> {
        self.nodes.extend_from_json(json)?;
        Ok(self)
    }

    /// Add one definition, replacing any built-in of the same type.
    pub fn with_node_type(mut self, def: NodeDefinition) -> Self {
        self.nodes.insert(def);
        self
    }

    pub fn node_type(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.nodes.get(node_type)
    }

    pub fn ports_compatible(&self, source: PortType, target: PortType) -> bool {
        source.can_connect_to(target)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/mod.rs"]
mod tests;
