use crate::foundation::core::Value;
use crate::graph::FlowGraph;
use crate::model::flow::Node;
use crate::registry::Registries;
use crate::registry::nodes::ExecutorKind;
use crate::registry::ports::PortType;
use crate::schema::issue::{Issue, IssueCode};

/// Statically known operand kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OperandKind {
    Number,
    Boolean,
    String,
    Other,
    /// Fed by an `any` port; only known at run time.
    Unknown,
}

impl OperandKind {
    pub(crate) fn of_value(v: &Value) -> Self {
        match v {
            Value::Number(_) => Self::Number,
            Value::Bool(_) => Self::Boolean,
            Value::String(_) => Self::String,
            _ => Self::Other,
        }
    }

    fn of_port(t: PortType) -> Self {
        match t {
            PortType::Number => Self::Number,
            PortType::Boolean => Self::Boolean,
            PortType::String | PortType::Color => Self::String,
            PortType::Any => Self::Unknown,
            _ => Self::Other,
        }
    }
}

pub(crate) fn is_ordering(op: &str) -> bool {
    matches!(op, "gt" | "gte" | "lt" | "lte")
}

/// Operand types of compare, boolean and math nodes, and the if/else condition.
pub fn validate_logic(graph: &FlowGraph<'_>, registries: &Registries) -> Vec<Issue> {
    let mut issues = Vec::new();
    for (idx, node) in graph.nodes().iter().enumerate() {
        let Some(def) = registries.node_type(&node.node_type) else {
            continue;
        };
        let operand = |port: &str| -> OperandKind {
            let fed = graph
                .incoming(idx)
                .find(|e| e.target_port_id == port)
                .and_then(|e| e.source_port_type);
            match fed {
                Some(t) => OperandKind::of_port(t),
                None => node
                    .data
                    .properties
                    .get(port)
                    .map_or(OperandKind::Unknown, OperandKind::of_value),
            }
        };
        let operator = node
            .data
            .properties
            .get("operator")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match def.executor {
            ExecutorKind::MathOp => {
                expect(node, "a", operand("a"), OperandKind::Number, &mut issues);
                expect(node, "b", operand("b"), OperandKind::Number, &mut issues);
            }
            ExecutorKind::BooleanOp => {
                expect(node, "a", operand("a"), OperandKind::Boolean, &mut issues);
                if operator != "not" {
                    expect(node, "b", operand("b"), OperandKind::Boolean, &mut issues);
                }
            }
            ExecutorKind::Compare if is_ordering(operator) => {
                let (a, b) = (operand("a"), operand("b"));
                let comparable = |k: OperandKind| {
                    matches!(
                        k,
                        OperandKind::Number | OperandKind::String | OperandKind::Unknown
                    )
                };
                let known_mismatch =
                    a != OperandKind::Unknown && b != OperandKind::Unknown && a != b;
                if !comparable(a) || !comparable(b) || known_mismatch {
                    issues.push(mismatch(
                        node,
                        format!(
                            "operator '{operator}' needs two numbers or two strings, got {a:?} and {b:?}"
                        ),
                    ));
                }
            }
            ExecutorKind::IfElse => {
                let cond = operand("condition");
                expect(node, "condition", cond, OperandKind::Boolean, &mut issues);
            }
            _ => {}
        }
    }
    issues
}

fn expect(node: &Node, port: &str, got: OperandKind, want: OperandKind, issues: &mut Vec<Issue>) {
    if got != want && got != OperandKind::Unknown {
        issues.push(mismatch(
            node,
            format!("operand '{port}' must be {want:?}, got {got:?}"),
        ));
    }
}

fn mismatch(node: &Node, detail: String) -> Issue {
    Issue::error(
        IssueCode::OperandTypeMismatch,
        format!("{}: {detail}", node.display_name()),
    )
    .at_node(&node.id)
    .suggest("Connect an input of the expected type or change the operand value")
}

#[cfg(test)]
#[path = "../../tests/unit/schema/logic.rs"]
mod tests;
