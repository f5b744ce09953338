use std::fmt;

use crate::foundation::core::{EdgeId, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Stable code of a soft problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    MissingTerminalNode,
    DuplicateNodeId,
    DuplicateEdgeId,
    DanglingEdge,
    UnknownPort,
    IncompatiblePorts,
    PortAlreadyConnected,
    DisconnectedRequiredPort,
    DuplicateDisplayName,
    NoGeometryUpstream,
    ConstraintViolation,
    InvalidPropertyType,
    UnknownBindingTarget,
    BindingTargetNotResult,
    UnfedBindingTarget,
    UnknownBindingField,
    InvalidOperator,
    OperandTypeMismatch,
    DivisionByZero,
    NonFiniteResult,
    SkippedEdge,
}

impl IssueCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingTerminalNode => "MISSING_TERMINAL_NODE",
            Self::DuplicateNodeId => "DUPLICATE_NODE_ID",
            Self::DuplicateEdgeId => "DUPLICATE_EDGE_ID",
            Self::DanglingEdge => "DANGLING_EDGE",
            Self::UnknownPort => "UNKNOWN_PORT",
            Self::IncompatiblePorts => "INCOMPATIBLE_PORTS",
            Self::PortAlreadyConnected => "PORT_ALREADY_CONNECTED",
            Self::DisconnectedRequiredPort => "DISCONNECTED_REQUIRED_PORT",
            Self::DuplicateDisplayName => "DUPLICATE_DISPLAY_NAME",
            Self::NoGeometryUpstream => "NO_GEOMETRY_UPSTREAM",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::InvalidPropertyType => "INVALID_PROPERTY_TYPE",
            Self::UnknownBindingTarget => "UNKNOWN_BINDING_TARGET",
            Self::BindingTargetNotResult => "BINDING_TARGET_NOT_RESULT",
            Self::UnfedBindingTarget => "UNFED_BINDING_TARGET",
            Self::UnknownBindingField => "UNKNOWN_BINDING_FIELD",
            Self::NonFiniteResult => "NON_FINITE_RESULT",
            Self::InvalidOperator => "INVALID_OPERATOR",
            Self::OperandTypeMismatch => "OPERAND_TYPE_MISMATCH",
            Self::DivisionByZero => "DIVISION_BY_ZERO",
            Self::SkippedEdge => "SKIPPED_EDGE",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One soft problem found by a validator or an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<EdgeId>,
}

impl Issue {
    pub fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            suggestions: Vec::new(),
            node_id: None,
            edge_id: None,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Info, code, message)
    }

    pub fn at_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_owned());
        self
    }

    pub fn at_edge(mut self, edge_id: &str) -> Self {
        self.edge_id = Some(edge_id.to_owned());
        self
    }

    pub fn suggest(mut self, hint: impl Into<String>) -> Self {
        self.suggestions.push(hint.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(n) = &self.node_id {
            write!(f, " (node {n})")?;
        }
        if let Some(e) = &self.edge_id {
            write!(f, " (edge {e})")?;
        }
        Ok(())
    }
}
