use serde::{Deserialize, Serialize};

/// Data type carried by a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortType {
    /// Universal stream of scene objects.
    ObjectStream,
    /// Stream fresh out of a geometry node.
    Geometry,
    /// Stream whose objects carry an appearance time.
    Timed,
    /// Stream whose objects carry animation tracks.
    Animated,
    Number,
    Boolean,
    String,
    Point,
    Color,
    /// Accepts and is accepted by every type.
    Any,
}

impl PortType {
    /// Whether values of this type are object streams.
    pub fn is_stream(self) -> bool {
        matches!(
            self,
            Self::ObjectStream | Self::Geometry | Self::Timed | Self::Animated
        )
    }

    /// Whether values of this type are scalars.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::Number | Self::Boolean | Self::String | Self::Point | Self::Color
        )
    }

    /// Compatibility lattice: may an output of type `self` feed an input of type `target`?
    ///
    /// `object_stream` sits at the top of the stream family and connects both ways with every
    /// refinement, so any stream can flow into any stream input. Numbers and booleans may
    /// feed string inputs (stringified by the consumer). Colors are strings on the wire.
    pub fn can_connect_to(self, target: PortType) -> bool {
        if self == target || self == Self::Any || target == Self::Any {
            return true;
        }
        match (self, target) {
            (Self::ObjectStream, t) if t.is_stream() => true,
            (s, Self::ObjectStream) if s.is_stream() => true,
            (Self::Number | Self::Boolean | Self::Color, Self::String) => true,
            (Self::String, Self::Color) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ObjectStream => "object_stream",
            Self::Geometry => "geometry",
            Self::Timed => "timed",
            Self::Animated => "animated",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Point => "point",
            Self::Color => "color",
            Self::Any => "any",
        };
        f.write_str(s)
    }
}

/// Port declaration on a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDef {
    pub id: String,
    pub port_type: PortType,
    /// Inputs only: an unconnected required port is reported by validation.
    #[serde(default)]
    pub required: bool,
    /// Inputs only: the port accepts more than one connection.
    #[serde(default)]
    pub multiple: bool,
}

impl PortDef {
    pub fn new(id: &str, port_type: PortType) -> Self {
        Self {
            id: id.to_owned(),
            port_type,
            required: false,
            multiple: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/ports.rs"]
mod tests;
