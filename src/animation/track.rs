use crate::animation::ease::Ease;
use crate::foundation::core::{TrackId, Value, ValueMap, lookup_in_map};
use crate::registry::tracks::TrackKind;
use serde::{Deserialize, Serialize};

/// Track as authored on an animation node: identity plus whatever fields the user set.
///
/// Missing fields are resolved per object at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSpec {
    #[serde(alias = "id")]
    pub identifier: TrackId,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    #[serde(flatten)]
    pub fields: ValueMap,
}

impl TrackSpec {
    pub fn new(identifier: &str, kind: TrackKind) -> Self {
        Self {
            identifier: identifier.to_owned(),
            kind,
            fields: ValueMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_owned(), value);
        self
    }

    /// User value at a dotted path (`"from.x"`).
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_in_map(&self.fields, path)
    }
}

/// Fully resolved track attached to a scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationTrack {
    pub identifier: TrackId,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub start_time: f64,
    pub duration: f64,
    pub easing: Ease,
    /// Type-specific values (`from`, `to`, `direction`, ...).
    #[serde(default)]
    pub properties: ValueMap,
}

impl AnimationTrack {
    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration.max(0.0)
    }

    /// Linear progress in `[0, 1]` at `time`, or `None` before the track starts.
    pub fn progress(&self, time: f64) -> Option<f64> {
        if time < self.start_time {
            return None;
        }
        if self.duration <= 0.0 {
            return Some(1.0);
        }
        Some(((time - self.start_time) / self.duration).clamp(0.0, 1.0))
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        lookup_in_map(&self.properties, key)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/track.rs"]
mod tests;
