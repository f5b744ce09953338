use crate::foundation::color::Rgba;
use crate::foundation::core::{Value, value_to_vec2, vec2_to_value};
use serde::{Deserialize, Serialize};

/// Declared type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    Number,
    /// `{ "x": f64, "y": f64 }`
    Point,
    /// CSS-like color literal.
    Color,
    String,
    Boolean,
    /// Array of strings (object id selections).
    StringList,
    /// Unconstrained JSON value.
    Any,
}

/// Per-type interpolation rules used when tracks are sampled.
pub trait Interpolator: Send + Sync {
    /// Interior interpolation for `t` in `(0, 1)`; `None` means the type holds `from`.
    fn mix(&self, from: &Value, to: &Value, t: f64) -> Option<Value>;

    /// Whether `value` is a well-formed instance of the type.
    fn validate(&self, value: &Value) -> bool;

    /// Value reached when progress completes.
    fn end_value(&self, from: &Value, to: &Value) -> Value {
        if to.is_null() {
            from.clone()
        } else {
            to.clone()
        }
    }

    /// Interpolate with exact endpoints: `t <= 0` yields `from` verbatim and `t >= 1` yields
    /// [`Interpolator::end_value`].
    fn interpolate(&self, from: &Value, to: &Value, t: f64) -> Value {
        if t <= 0.0 || t.is_nan() {
            return from.clone();
        }
        if t >= 1.0 {
            return self.end_value(from, to);
        }
        self.mix(from, to, t).unwrap_or_else(|| from.clone())
    }
}

#[derive(Debug, Default)]
struct NumberInterpolator;

impl Interpolator for NumberInterpolator {
    fn mix(&self, from: &Value, to: &Value, t: f64) -> Option<Value> {
        let a = from.as_f64()?;
        let b = to.as_f64()?;
        Some(Value::from(a + (b - a) * t))
    }

    fn validate(&self, value: &Value) -> bool {
        value.as_f64().is_some_and(f64::is_finite)
    }
}

#[derive(Debug, Default)]
struct PointInterpolator;

impl Interpolator for PointInterpolator {
    fn mix(&self, from: &Value, to: &Value, t: f64) -> Option<Value> {
        let a = value_to_vec2(from)?;
        let b = value_to_vec2(&self.end_value(from, to))?;
        Some(vec2_to_value(a.lerp(b, t)))
    }

    fn validate(&self, value: &Value) -> bool {
        value_to_vec2(value).is_some_and(|v| v.x.is_finite() && v.y.is_finite())
    }

    /// A partial `to` (one axis set) keeps the other axis from `from`.
    fn end_value(&self, from: &Value, to: &Value) -> Value {
        match (from, to) {
            (Value::Object(f), Value::Object(t)) => {
                let mut out = t.clone();
                crate::foundation::core::merge_missing(&mut out, f);
                Value::Object(out)
            }
            (_, Value::Null) => from.clone(),
            _ => to.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct ColorInterpolator;

impl Interpolator for ColorInterpolator {
    fn mix(&self, from: &Value, to: &Value, t: f64) -> Option<Value> {
        let a = Rgba::parse(from.as_str()?).ok()?;
        let b = Rgba::parse(to.as_str()?).ok()?;
        Some(Value::String(a.lerp(b, t).to_string()))
    }

    fn validate(&self, value: &Value) -> bool {
        value.as_str().is_some_and(|s| Rgba::parse(s).is_ok())
    }
}

/// Discrete types hold `from` until the transition completes.
#[derive(Debug)]
struct StepInterpolator {
    ty: ValueType,
}

impl Interpolator for StepInterpolator {
    fn mix(&self, _from: &Value, _to: &Value, _t: f64) -> Option<Value> {
        None
    }

    fn validate(&self, value: &Value) -> bool {
        match self.ty {
            ValueType::String => value.is_string(),
            ValueType::Boolean => value.is_boolean(),
            ValueType::StringList => value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string)),
            _ => true,
        }
    }
}

static NUMBER: NumberInterpolator = NumberInterpolator;
static POINT: PointInterpolator = PointInterpolator;
static COLOR: ColorInterpolator = ColorInterpolator;
static STRING: StepInterpolator = StepInterpolator {
    ty: ValueType::String,
};
static BOOLEAN: StepInterpolator = StepInterpolator {
    ty: ValueType::Boolean,
};
static STRING_LIST: StepInterpolator = StepInterpolator {
    ty: ValueType::StringList,
};
static ANY: StepInterpolator = StepInterpolator { ty: ValueType::Any };

/// Lookup table from [`ValueType`] to its interpolator.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolatorRegistry;

impl InterpolatorRegistry {
    pub fn get(&self, ty: ValueType) -> &'static dyn Interpolator {
        match ty {
            ValueType::Number => &NUMBER,
            ValueType::Point => &POINT,
            ValueType::Color => &COLOR,
            ValueType::String => &STRING,
            ValueType::Boolean => &BOOLEAN,
            ValueType::StringList => &STRING_LIST,
            ValueType::Any => &ANY,
        }
    }

    pub fn interpolate(&self, ty: ValueType, from: &Value, to: &Value, t: f64) -> Value {
        self.get(ty).interpolate(from, to, t)
    }

    pub fn validate(&self, ty: ValueType, value: &Value) -> bool {
        self.get(ty).validate(value)
    }

    pub fn end_value(&self, ty: ValueType, from: &Value, to: &Value) -> Value {
        self.get(ty).end_value(from, to)
    }
}

/// Interpolate two color literals. Returns `None` if either side does not parse.
///
/// `t <= 0` returns `from` verbatim and `t >= 1` returns `to` verbatim; in between the
/// result is formatted as `rgb(..)` or `rgba(..)`.
pub fn lerp_color(from: &str, to: &str, t: f64) -> Option<String> {
    let a = Rgba::parse(from).ok()?;
    let b = Rgba::parse(to).ok()?;
    if t <= 0.0 {
        return Some(from.to_owned());
    }
    if t >= 1.0 {
        return Some(to.to_owned());
    }
    Some(a.lerp(b, t).to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/registry/interp.rs"]
mod tests;
