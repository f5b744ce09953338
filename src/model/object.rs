use crate::animation::track::AnimationTrack;
use crate::foundation::core::{NodeId, ObjectId, ValueMap, Vec2, merge_missing};
use serde::{Deserialize, Serialize};

/// Drawable kind produced by a geometry node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Rectangle,
    Circle,
    Triangle,
    Polygon,
    Text,
    Image,
}

/// Transform and paint an object starts from before any track applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialState {
    pub position: Vec2,
    pub rotation: f64,
    pub scale: Vec2,
    pub opacity: f64,
    pub fill_color: String,
    pub stroke_color: String,
    pub stroke_width: f64,
}

impl Default for InitialState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::new(1.0, 1.0),
            opacity: 1.0,
            fill_color: "#4444ff".to_owned(),
            stroke_color: "#ffffff".to_owned(),
            stroke_width: 0.0,
        }
    }
}

/// Provenance of an object: the geometry node that created it and every node it passed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectLineage {
    pub origin_node: NodeId,
    #[serde(default)]
    pub path: Vec<NodeId>,
}

/// One drawable object flowing through the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    /// Kind-specific resolved properties (`width`, `radius`, `content`, ...).
    #[serde(default)]
    pub properties: ValueMap,
    pub initial: InitialState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance_time: Option<f64>,
    #[serde(default)]
    pub tracks: Vec<AnimationTrack>,
    pub lineage: ObjectLineage,
}

impl SceneObject {
    /// Record that the object passed through `node_id`.
    pub fn visit(&mut self, node_id: &str) {
        if self.lineage.path.last().map(String::as_str) != Some(node_id) {
            self.lineage.path.push(node_id.to_owned());
        }
    }

    /// Fill fields this object leaves unset from a lower-priority copy of the same object.
    ///
    /// Properties are deep-filled, a missing appearance time is adopted, tracks with unseen
    /// identifiers are appended and lineage paths are unioned. Fields already set here win.
    pub fn merge_missing_from(&mut self, other: &SceneObject) {
        merge_missing(&mut self.properties, &other.properties);
        if self.appearance_time.is_none() {
            self.appearance_time = other.appearance_time;
        }
        for track in &other.tracks {
            if !self.tracks.iter().any(|t| t.identifier == track.identifier) {
                self.tracks.push(track.clone());
            }
        }
        for node in &other.lineage.path {
            if !self.lineage.path.contains(node) {
                self.lineage.path.push(node.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/object.rs"]
mod tests;
