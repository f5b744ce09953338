use std::collections::BTreeMap;

use crate::foundation::core::Value;
use crate::foundation::error::{FlowError, FlowResult};
use crate::model::object::ObjectKind;
use crate::registry::interp::ValueType;
use crate::registry::ports::{PortDef, PortType};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Evaluation-rule family of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    Geometry,
    Timing,
    Logic,
    Animation,
    Output,
}

/// Executor bound to a node type. Dispatch matches on this exhaustively, so adding a
/// variant forces every consumer to handle it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutorKind {
    Geometry { object: ObjectKind },
    Insert,
    Filter,
    Merge,
    Compare,
    BooleanOp,
    MathOp,
    IfElse,
    Constant,
    Result,
    Animation,
    Scene,
    Frame,
}

impl ExecutorKind {
    pub fn category(self) -> NodeCategory {
        match self {
            Self::Geometry { .. } => NodeCategory::Geometry,
            Self::Insert => NodeCategory::Timing,
            Self::Filter
            | Self::Merge
            | Self::Compare
            | Self::BooleanOp
            | Self::MathOp
            | Self::IfElse
            | Self::Constant
            | Self::Result => NodeCategory::Logic,
            Self::Animation => NodeCategory::Animation,
            Self::Scene | Self::Frame => NodeCategory::Output,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.category() == NodeCategory::Output
    }
}

/// Optional value constraints declared by a property schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Constraints {
    /// Human readable description of the first violated constraint, if any.
    pub fn violation(&self, value: &Value) -> Option<String> {
        if let Some(x) = value.as_f64() {
            if let Some(min) = self.min
                && x < min
            {
                return Some(format!("{x} is below the minimum {min}"));
            }
            if let Some(max) = self.max
                && x > max
            {
                return Some(format!("{x} is above the maximum {max}"));
            }
        }
        if let (Some(options), Some(s)) = (&self.options, value.as_str())
            && !options.iter().any(|o| o == s)
        {
            return Some(format!("\"{s}\" is not one of [{}]", options.join(", ")));
        }
        None
    }
}

/// One property declared by a node or track type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    pub key: String,
    pub value_type: ValueType,
    pub default: Value,
    #[serde(default)]
    pub constraints: Constraints,
}

impl PropertySchema {
    pub fn new(key: &str, value_type: ValueType, default: Value) -> Self {
        Self {
            key: key.to_owned(),
            value_type,
            default,
            constraints: Constraints::default(),
        }
    }

    pub fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.constraints.min = min;
        self.constraints.max = max;
        self
    }

    pub fn options(mut self, options: &[&str]) -> Self {
        self.constraints.options = Some(options.iter().map(|s| (*s).to_owned()).collect());
        self
    }
}

/// Declaration of a node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    #[serde(rename = "type")]
    pub node_type: String,
    pub label: String,
    pub executor: ExecutorKind,
    #[serde(default)]
    pub inputs: Vec<PortDef>,
    #[serde(default)]
    pub outputs: Vec<PortDef>,
    #[serde(default)]
    pub properties: Vec<PropertySchema>,
    /// Editor rendering hints; carried through untouched.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub rendering: Value,
}

impl NodeDefinition {
    pub fn category(&self) -> NodeCategory {
        self.executor.category()
    }

    pub fn input(&self, id: &str) -> Option<&PortDef> {
        self.inputs.iter().find(|p| p.id == id)
    }

    pub fn output(&self, id: &str) -> Option<&PortDef> {
        self.outputs.iter().find(|p| p.id == id)
    }

    pub fn property(&self, key: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.key == key)
    }

    /// Registry default for a dotted property path (`"position.x"`).
    pub fn default_at(&self, path: &str) -> Option<&Value> {
        schema_default_at(&self.properties, path)
    }
}

/// Default for a dotted path within a list of property schemas.
pub(crate) fn schema_default_at<'s>(schemas: &'s [PropertySchema], path: &str) -> Option<&'s Value> {
    if let Some(p) = schemas.iter().find(|p| p.key == path) {
        return Some(&p.default);
    }
    let (head, rest) = path.split_once('.')?;
    let p = schemas.iter().find(|p| p.key == head)?;
    crate::foundation::core::lookup_path(&p.default, rest)
}

/// Node type table, keyed by type name.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeRegistry {
    types: BTreeMap<String, NodeDefinition>,
}

impl NodeTypeRegistry {
    pub fn builtin() -> Self {
        let mut reg = Self::default();
        for def in builtin_definitions() {
            reg.insert(def);
        }
        reg
    }

    pub fn get(&self, node_type: &str) -> Option<&NodeDefinition> {
        self.types.get(node_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Add or replace a definition. Only callable while the registry is still being built.
    pub(crate) fn insert(&mut self, def: NodeDefinition) {
        self.types.insert(def.node_type.clone(), def);
    }

    /// Add definitions from a JSON array of [`NodeDefinition`] objects.
    pub(crate) fn extend_from_json(&mut self, json: &str) -> FlowResult<()> {
        let defs: Vec<NodeDefinition> = serde_json::from_str(json)?;
        for def in defs {
            if def.node_type.trim().is_empty() {
                return Err(FlowError::invalid("node definition with empty type"));
            }
            self.insert(def);
        }
        Ok(())
    }
}

fn common_object_properties(fill: &str) -> Vec<PropertySchema> {
    vec![
        PropertySchema::new("position", ValueType::Point, json!({ "x": 0.0, "y": 0.0 })),
        PropertySchema::new("rotation", ValueType::Number, json!(0.0)),
        PropertySchema::new("scale", ValueType::Point, json!({ "x": 1.0, "y": 1.0 })),
        PropertySchema::new("opacity", ValueType::Number, json!(1.0)).range(Some(0.0), Some(1.0)),
        PropertySchema::new("fillColor", ValueType::Color, json!(fill)),
        PropertySchema::new("strokeColor", ValueType::Color, json!("#ffffff")),
        PropertySchema::new("strokeWidth", ValueType::Number, json!(0.0)).range(Some(0.0), None),
    ]
}

fn geometry(node_type: &str, label: &str, object: ObjectKind, extra: Vec<PropertySchema>) -> NodeDefinition {
    let fill = match object {
        ObjectKind::Text => "#ffffff",
        _ => "#4444ff",
    };
    let mut properties = extra;
    properties.extend(common_object_properties(fill));
    NodeDefinition {
        node_type: node_type.to_owned(),
        label: label.to_owned(),
        executor: ExecutorKind::Geometry { object },
        inputs: vec![],
        outputs: vec![PortDef::new("output", PortType::Geometry)],
        properties,
        rendering: Value::Null,
    }
}

fn logic(
    node_type: &str,
    label: &str,
    executor: ExecutorKind,
    inputs: Vec<PortDef>,
    outputs: Vec<PortDef>,
    properties: Vec<PropertySchema>,
) -> NodeDefinition {
    NodeDefinition {
        node_type: node_type.to_owned(),
        label: label.to_owned(),
        executor,
        inputs,
        outputs,
        properties,
        rendering: Value::Null,
    }
}

/// Number of prioritized inputs on the built-in merge node.
pub const MERGE_INPUTS: usize = 5;

fn builtin_definitions() -> Vec<NodeDefinition> {
    use PropertySchema as P;
    use ValueType as V;

    let mut defs = vec![
        geometry(
            "rectangle",
            "Rectangle",
            ObjectKind::Rectangle,
            vec![
                P::new("width", V::Number, json!(100.0)).range(Some(0.0), None),
                P::new("height", V::Number, json!(60.0)).range(Some(0.0), None),
                P::new("cornerRadius", V::Number, json!(0.0)).range(Some(0.0), None),
            ],
        ),
        geometry(
            "circle",
            "Circle",
            ObjectKind::Circle,
            vec![P::new("radius", V::Number, json!(50.0)).range(Some(0.0), None)],
        ),
        geometry(
            "triangle",
            "Triangle",
            ObjectKind::Triangle,
            vec![P::new("size", V::Number, json!(80.0)).range(Some(0.0), None)],
        ),
        geometry(
            "text",
            "Text",
            ObjectKind::Text,
            vec![
                P::new("content", V::String, json!("Text")),
                P::new("fontFamily", V::String, json!("Arial")),
                P::new("fontSize", V::Number, json!(24.0)).range(Some(1.0), None),
                P::new("fontWeight", V::String, json!("normal"))
                    .options(&["normal", "bold", "lighter", "bolder"]),
            ],
        ),
        geometry(
            "image",
            "Image",
            ObjectKind::Image,
            vec![
                P::new("assetId", V::String, json!("")),
                P::new("width", V::Number, json!(200.0)).range(Some(0.0), None),
                P::new("height", V::Number, json!(200.0)).range(Some(0.0), None),
            ],
        ),
        NodeDefinition {
            node_type: "insert".to_owned(),
            label: "Insert".to_owned(),
            executor: ExecutorKind::Insert,
            inputs: vec![PortDef::new("input", PortType::ObjectStream).required()],
            outputs: vec![PortDef::new("output", PortType::Timed)],
            properties: vec![
                P::new("appearanceTime", V::Number, json!(0.0)).range(Some(0.0), None),
            ],
            rendering: Value::Null,
        },
        logic(
            "filter",
            "Filter",
            ExecutorKind::Filter,
            vec![PortDef::new("input", PortType::ObjectStream).required()],
            vec![PortDef::new("output", PortType::ObjectStream)],
            vec![P::new("selectedObjectIds", V::StringList, json!([]))],
        ),
        logic(
            "merge",
            "Merge",
            ExecutorKind::Merge,
            (1..=MERGE_INPUTS)
                .map(|i| PortDef::new(&format!("input{i}"), PortType::ObjectStream))
                .collect(),
            vec![PortDef::new("output", PortType::ObjectStream)],
            vec![],
        ),
        logic(
            "compare",
            "Compare",
            ExecutorKind::Compare,
            vec![
                PortDef::new("a", PortType::Any),
                PortDef::new("b", PortType::Any),
            ],
            vec![PortDef::new("result", PortType::Boolean)],
            vec![
                P::new("operator", V::String, json!("gt"))
                    .options(&["gt", "gte", "lt", "lte", "eq", "neq"]),
                P::new("a", V::Any, json!(0.0)),
                P::new("b", V::Any, json!(0.0)),
            ],
        ),
        logic(
            "boolean_op",
            "Boolean",
            ExecutorKind::BooleanOp,
            vec![
                PortDef::new("a", PortType::Boolean),
                PortDef::new("b", PortType::Boolean),
            ],
            vec![PortDef::new("result", PortType::Boolean)],
            vec![
                P::new("operator", V::String, json!("and")).options(&["and", "or", "xor", "not"]),
                P::new("a", V::Boolean, json!(false)),
                P::new("b", V::Boolean, json!(false)),
            ],
        ),
        logic(
            "math_op",
            "Math",
            ExecutorKind::MathOp,
            vec![
                PortDef::new("a", PortType::Number),
                PortDef::new("b", PortType::Number),
            ],
            vec![PortDef::new("result", PortType::Number)],
            vec![
                P::new("operator", V::String, json!("add")).options(&[
                    "add", "subtract", "multiply", "divide", "modulo", "power", "min", "max",
                ]),
                P::new("a", V::Number, json!(0.0)),
                P::new("b", V::Number, json!(0.0)),
            ],
        ),
        logic(
            "if_else",
            "If / Else",
            ExecutorKind::IfElse,
            vec![
                PortDef::new("condition", PortType::Boolean),
                PortDef::new("input", PortType::Any).required(),
            ],
            vec![
                PortDef::new("true", PortType::Any),
                PortDef::new("false", PortType::Any),
            ],
            vec![P::new("condition", V::Boolean, json!(false))],
        ),
        logic(
            "constant",
            "Constant",
            ExecutorKind::Constant,
            vec![],
            vec![PortDef::new("value", PortType::Any)],
            vec![P::new("value", V::Any, json!(0.0))],
        ),
        logic(
            "result",
            "Result",
            ExecutorKind::Result,
            vec![PortDef::new("input", PortType::Any).required()],
            vec![PortDef::new("value", PortType::Any)],
            vec![],
        ),
        NodeDefinition {
            node_type: "animation".to_owned(),
            label: "Animation".to_owned(),
            executor: ExecutorKind::Animation,
            inputs: vec![PortDef::new("input", PortType::ObjectStream).required()],
            outputs: vec![PortDef::new("output", PortType::Animated)],
            properties: vec![],
            rendering: Value::Null,
        },
    ];

    defs.push(NodeDefinition {
        node_type: "scene".to_owned(),
        label: "Scene".to_owned(),
        executor: ExecutorKind::Scene,
        inputs: vec![
            PortDef::new("input", PortType::ObjectStream)
                .required()
                .multiple(),
        ],
        outputs: vec![],
        properties: vec![
            P::new("width", V::Number, json!(1920)).range(Some(1.0), None),
            P::new("height", V::Number, json!(1080)).range(Some(1.0), None),
            P::new("fps", V::Number, json!(60)).range(Some(1.0), Some(240.0)),
            P::new("duration", V::Number, json!(4.0)).range(Some(0.0), None),
            P::new("backgroundColor", V::Color, json!("#000000")),
            P::new("videoPreset", V::String, json!("medium")).options(&[
                "ultrafast", "superfast", "veryfast", "faster", "fast", "medium", "slow",
                "slower", "veryslow",
            ]),
            P::new("videoCrf", V::Number, json!(18)).range(Some(0.0), Some(51.0)),
        ],
        rendering: Value::Null,
    });
    defs.push(NodeDefinition {
        node_type: "frame".to_owned(),
        label: "Frame".to_owned(),
        executor: ExecutorKind::Frame,
        inputs: vec![
            PortDef::new("input", PortType::ObjectStream)
                .required()
                .multiple(),
        ],
        outputs: vec![],
        properties: vec![
            P::new("width", V::Number, json!(1920)).range(Some(1.0), None),
            P::new("height", V::Number, json!(1080)).range(Some(1.0), None),
            P::new("backgroundColor", V::Color, json!("#000000")),
            P::new("format", V::String, json!("png")).options(&["png", "jpeg", "webp"]),
            P::new("quality", V::Number, json!(90)).range(Some(1.0), Some(100.0)),
        ],
        rendering: Value::Null,
    });
    defs
}

#[cfg(test)]
#[path = "../../tests/unit/registry/nodes.rs"]
mod tests;
