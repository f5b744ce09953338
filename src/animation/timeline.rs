use crate::animation::track::AnimationTrack;
use crate::foundation::core::{Value, Vec2, value_to_vec2, vec2_to_value};
use crate::model::object::SceneObject;
use crate::registry::Registries;
use crate::registry::interp::ValueType;
use crate::registry::tracks::TrackKind;
use serde::{Deserialize, Serialize};

/// Object state at one point in time, as a renderer would draw it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectState {
    pub position: Vec2,
    pub rotation: f64,
    pub scale: Vec2,
    pub opacity: f64,
    pub fill_color: String,
    pub stroke_color: String,
    /// `false` before the object's appearance time.
    pub visible: bool,
}

/// Sample an object's tracks at `time` (seconds).
///
/// Tracks apply in start-time order, each overwriting the channel it drives; tracks that have
/// not started yet leave the state untouched. A finished track holds its end value.
pub fn sample_object(object: &SceneObject, time: f64, registries: &Registries) -> ObjectState {
    let init = &object.initial;
    let mut state = ObjectState {
        position: init.position,
        rotation: init.rotation,
        scale: init.scale,
        opacity: init.opacity,
        fill_color: init.fill_color.clone(),
        stroke_color: init.stroke_color.clone(),
        visible: object.appearance_time.is_none_or(|t| time >= t),
    };

    let mut tracks: Vec<&AnimationTrack> = object.tracks.iter().collect();
    tracks.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    for track in tracks {
        let Some(progress) = track.progress(time) else {
            continue;
        };
        let t = track.easing.apply(progress);
        apply_track(&mut state, track, t, registries);
    }
    state
}

fn apply_track(state: &mut ObjectState, track: &AnimationTrack, t: f64, registries: &Registries) {
    let interp = &registries.interpolators;
    let field = |key: &str| -> Value {
        track
            .property(key)
            .or_else(|| registries.tracks.default_at(track.kind, key))
            .cloned()
            .unwrap_or(Value::Null)
    };

    match track.kind {
        TrackKind::Move => {
            let v = interp.interpolate(ValueType::Point, &field("from"), &field("to"), t);
            if let Some(p) = value_to_vec2(&v) {
                state.position = p;
            }
        }
        TrackKind::Rotate => {
            let v = interp.interpolate(ValueType::Number, &field("from"), &field("to"), t);
            if let Some(r) = v.as_f64() {
                state.rotation = r;
            }
        }
        TrackKind::Scale => {
            let (from, to) = (field("from"), field("to"));
            if from.is_object() || to.is_object() {
                let v = interp.interpolate(ValueType::Point, &as_point(&from), &as_point(&to), t);
                if let Some(s) = value_to_vec2(&v) {
                    state.scale = s;
                }
            } else if let Some(s) = interp.interpolate(ValueType::Number, &from, &to, t).as_f64() {
                state.scale = Vec2::new(s, s);
            }
        }
        TrackKind::Fade => {
            let v = interp.interpolate(ValueType::Number, &field("from"), &field("to"), t);
            if let Some(o) = v.as_f64() {
                state.opacity = o.clamp(0.0, 1.0);
            }
        }
        TrackKind::Color => {
            let v = interp.interpolate(ValueType::Color, &field("from"), &field("to"), t);
            if let Some(c) = v.as_str() {
                match field("property").as_str() {
                    Some("stroke") => state.stroke_color = c.to_owned(),
                    _ => state.fill_color = c.to_owned(),
                }
            }
        }
        TrackKind::Slide => {
            let distance = field("distance").as_f64().unwrap_or(0.0);
            let dir = match field("direction").as_str() {
                Some("right") => Vec2::new(1.0, 0.0),
                Some("up") => Vec2::new(0.0, -1.0),
                Some("down") => Vec2::new(0.0, 1.0),
                _ => Vec2::new(-1.0, 0.0),
            };
            state.position += dir * distance * (1.0 - t);
        }
    }
}

/// Uniform scalars become `{x: s, y: s}` so they can mix with point values.
fn as_point(v: &Value) -> Value {
    match v.as_f64() {
        Some(s) => vec2_to_value(Vec2::new(s, s)),
        None => v.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/timeline.rs"]
mod tests;
