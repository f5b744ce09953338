use std::collections::BTreeMap;

use crate::foundation::core::Value;
use crate::registry::interp::ValueType;
use crate::registry::nodes::{PropertySchema, schema_default_at};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Kind of animated change a track applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Move,
    Rotate,
    Scale,
    Fade,
    Color,
    Slide,
}

impl TrackKind {
    pub const ALL: [TrackKind; 6] = [
        Self::Move,
        Self::Rotate,
        Self::Scale,
        Self::Fade,
        Self::Color,
        Self::Slide,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Move => "move",
            Self::Rotate => "rotate",
            Self::Scale => "scale",
            Self::Fade => "fade",
            Self::Color => "color",
            Self::Slide => "slide",
        }
    }
}

/// Property schema of one track kind. Timing fields (`startTime`, `duration`, `easing`)
/// are part of every schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackDefinition {
    pub kind: TrackKind,
    pub properties: Vec<PropertySchema>,
}

impl TrackDefinition {
    pub fn property(&self, key: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Type-specific properties (everything except the shared timing fields).
    pub fn specific_properties(&self) -> impl Iterator<Item = &PropertySchema> {
        self.properties
            .iter()
            .filter(|p| !matches!(p.key.as_str(), "startTime" | "duration" | "easing"))
    }
}

#[derive(Debug, Clone)]
pub struct TrackRegistry {
    defs: BTreeMap<TrackKind, TrackDefinition>,
}

impl TrackRegistry {
    pub fn builtin() -> Self {
        let defs = TrackKind::ALL
            .into_iter()
            .map(|kind| (kind, builtin_definition(kind)))
            .collect();
        Self { defs }
    }

    pub fn get(&self, kind: TrackKind) -> Option<&TrackDefinition> {
        self.defs.get(&kind)
    }

    /// Registry default for a dotted path on a track kind (`"from.x"`).
    pub fn default_at(&self, kind: TrackKind, path: &str) -> Option<&Value> {
        schema_default_at(&self.get(kind)?.properties, path)
    }
}

impl Default for TrackRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_definition(kind: TrackKind) -> TrackDefinition {
    use PropertySchema as P;
    use ValueType as V;

    let mut properties = vec![
        P::new("startTime", V::Number, json!(0.0)).range(Some(0.0), None),
        P::new("duration", V::Number, json!(1.0)).range(Some(0.0), None),
        P::new("easing", V::String, json!("easeInOut")).options(&[
            "linear",
            "easeIn",
            "easeOut",
            "easeInOut",
            "easeInCubic",
            "easeOutCubic",
            "easeInOutCubic",
        ]),
    ];
    let specific = match kind {
        TrackKind::Move => vec![
            P::new("from", V::Point, json!({ "x": 0.0, "y": 0.0 })),
            P::new("to", V::Point, json!({ "x": 100.0, "y": 0.0 })),
        ],
        TrackKind::Rotate => vec![
            P::new("from", V::Number, json!(0.0)),
            P::new("to", V::Number, json!(360.0)),
        ],
        TrackKind::Scale => vec![
            P::new("from", V::Number, json!(1.0)),
            P::new("to", V::Number, json!(1.5)),
        ],
        TrackKind::Fade => vec![
            P::new("from", V::Number, json!(0.0)).range(Some(0.0), Some(1.0)),
            P::new("to", V::Number, json!(1.0)).range(Some(0.0), Some(1.0)),
        ],
        TrackKind::Color => vec![
            P::new("from", V::Color, json!("#ff0000")),
            P::new("to", V::Color, json!("#0000ff")),
            P::new("property", V::String, json!("fill")).options(&["fill", "stroke"]),
        ],
        TrackKind::Slide => vec![
            P::new("direction", V::String, json!("left"))
                .options(&["left", "right", "up", "down"]),
            P::new("distance", V::Number, json!(100.0)).range(Some(0.0), None),
        ],
    };
    properties.extend(specific);
    TrackDefinition { kind, properties }
}

#[cfg(test)]
#[path = "../../tests/unit/registry/tracks.rs"]
mod tests;
