/// Convenience result type used across animgraph.
pub type FlowResult<T> = Result<T, FlowError>;

/// Fatal engine errors. Soft problems never show up here; they are collected as
/// [`crate::Issue`] values instead.
#[derive(thiserror::Error, Debug)]
pub enum FlowError {
    /// No scene/frame output node is present and the run requires one.
    #[error("structural error: the flow has no scene or frame output node")]
    MissingTerminal,

    /// The graph contains a cycle through the listed nodes.
    #[error("structural error: cycle detected through nodes [{}]", .nodes.join(", "))]
    Cycle {
        /// Nodes that could not be ordered (every member of every cycle, plus their dependents).
        nodes: Vec<String>,
    },

    /// A node references a type the node registry does not know.
    #[error("structural error: node '{node_id}' has unknown type '{node_type}'")]
    UnknownNodeType {
        /// Offending node.
        node_id: String,
        /// Type key that failed to resolve.
        node_type: String,
    },

    /// An operation referenced a node id absent from the flow.
    #[error("structural error: unknown node '{0}'")]
    UnknownNode(String),

    /// Execution finished but no output node received any object.
    #[error("structural error: no valid scenes were produced")]
    NoValidScenes,

    /// Input data that cannot be turned into a flow at all.
    #[error("invalid flow: {0}")]
    InvalidFlow(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FlowError {
    /// Build a [`FlowError::Cycle`] value.
    pub fn cycle(nodes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::Cycle {
            nodes: nodes.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a [`FlowError::UnknownNodeType`] value.
    pub fn unknown_node_type(node_id: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType {
            node_id: node_id.into(),
            node_type: node_type.into(),
        }
    }

    /// Build a [`FlowError::UnknownNode`] value.
    pub fn unknown_node(node_id: impl Into<String>) -> Self {
        Self::UnknownNode(node_id.into())
    }

    /// Build a [`FlowError::InvalidFlow`] value.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFlow(msg.into())
    }

    /// Build a [`FlowError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingTerminal => "MISSING_TERMINAL_NODE",
            Self::Cycle { .. } => "CYCLE_DETECTED",
            Self::UnknownNodeType { .. } => "UNKNOWN_NODE_TYPE",
            Self::UnknownNode(_) => "UNKNOWN_NODE",
            Self::NoValidScenes => "NO_VALID_SCENES",
            Self::InvalidFlow(_) => "INVALID_FLOW",
            Self::Serde(_) => "SERIALIZATION_ERROR",
            Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Remediation hints shown next to the message.
    pub fn suggestions(&self) -> Vec<String> {
        let hints: &[&str] = match self {
            Self::MissingTerminal => &[
                "Add a Scene or Frame node to the flow",
                "Connect your object stream to the output node's input",
            ],
            Self::Cycle { .. } => &[
                "Remove one of the connections that loops back upstream",
                "Use a Merge node to combine streams instead of feeding outputs back",
            ],
            Self::UnknownNodeType { .. } => &[
                "Delete the node and re-create it from the node palette",
                "Check that the flow was saved by a compatible version",
            ],
            Self::UnknownNode(_) => &["Pick a node that exists in the current flow"],
            Self::NoValidScenes => &[
                "Connect at least one shape, text or image node to a Scene or Frame node",
                "Check that Filter nodes are not removing every object",
            ],
            Self::InvalidFlow(_) | Self::Serde(_) => &["Re-export the flow and try again"],
            Self::Other(_) => &[],
        };
        hints.iter().map(|s| (*s).to_owned()).collect()
    }
}

/// Error shape crossing the engine boundary: a stable code, a human message and hints.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct UserFacingError {
    /// Stable machine-readable code.
    pub code: String,
    /// Human readable message.
    pub message: String,
    /// Zero or more remediation hints.
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl UserFacingError {
    /// Resource or quota failure reported by a collaborator (job limits, storage), surfaced in
    /// the same shape as engine errors.
    pub fn resource(
        code: impl Into<String>,
        message: impl Into<String>,
        suggestions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            suggestions: suggestions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&FlowError> for UserFacingError {
    fn from(err: &FlowError) -> Self {
        Self {
            code: err.code().to_owned(),
            message: err.to_string(),
            suggestions: err.suggestions(),
        }
    }
}

impl From<FlowError> for UserFacingError {
    fn from(err: FlowError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for UserFacingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
