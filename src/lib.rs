//! animgraph executes animation node graphs.
//!
//! A flow is a directed graph of typed nodes (shapes, timing, logic, animation tracks and
//! scene/frame outputs). The engine turns it into self-contained render specifications:
//!
//! - Parse a [`FlowDocument`] and normalize it with [`normalize_flow`]
//! - Check it with [`validate_flow`]
//! - Run it with [`execute_flow`] (or [`execute_flow_debug`] up to one node)
//! - Split the produced objects per output with [`partition_objects_by_scenes`]
//!
//! [`run_flow`] chains the last two steps.
#![forbid(unsafe_code)]

mod foundation;

pub mod animation;
pub mod compile;
pub mod eval;
pub mod graph;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod schema;

pub use crate::foundation::color::Rgba;
pub use crate::foundation::core::{NodeId, ObjectId, PortId, TrackId, Value, ValueMap, Vec2};
pub use crate::foundation::error::{FlowError, FlowResult, UserFacingError};

pub use crate::animation::ease::Ease;
pub use crate::animation::timeline::{ObjectState, sample_object};
pub use crate::animation::track::{AnimationTrack, TrackSpec};
pub use crate::compile::partition::{
    FrameConfig, OutputConfig, PartitionFingerprint, SceneConfig, ScenePartition,
    partition_objects_by_scenes,
};
pub use crate::eval::context::{ExecutionContext, LogAction, LogEntry, NodeOutput, PortValue};
pub use crate::eval::engine::{ExecuteOptions, execute_flow, execute_flow_debug};
pub use crate::model::flow::{Edge, Node, NodeData};
pub use crate::model::object::{ObjectKind, SceneObject};
pub use crate::normalize::defs::FlowDocument;
pub use crate::normalize::pass::{NormalizedFlow, normalize_flow};
pub use crate::pipeline::{FlowRun, load_flow, run_flow};
pub use crate::registry::Registries;
pub use crate::registry::ports::PortType;
pub use crate::resolve::{FieldKey, Resolved, Tier};
pub use crate::schema::issue::{Issue, IssueCode, Severity};
pub use crate::schema::validate_flow;
