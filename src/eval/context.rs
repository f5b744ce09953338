use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::foundation::core::{NodeId, ObjectId, PortId, Value};
use crate::foundation::error::{FlowError, FlowResult};
use crate::graph::FlowGraph;
use crate::model::object::SceneObject;
use crate::registry::Registries;
use crate::resolve::{FieldKey, LiveValues, Resolved, node_resolver};
use crate::schema::issue::Issue;
use chrono::{DateTime, Utc};
use serde::Serialize;
use smallvec::SmallVec;

/// Value carried by one output port.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PortValue {
    /// Object stream. Objects are shared until an executor needs to change one.
    Objects(Vec<Arc<SceneObject>>),
    Scalar(Value),
}

impl PortValue {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::Objects(_) => None,
        }
    }

    pub fn as_objects(&self) -> Option<&[Arc<SceneObject>]> {
        match self {
            Self::Objects(o) => Some(o),
            Self::Scalar(_) => None,
        }
    }

    /// Serializable snapshot for the execution log.
    pub fn snapshot(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Values a node produced, by output port id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NodeOutput {
    pub ports: BTreeMap<PortId, PortValue>,
}

impl NodeOutput {
    pub fn single(port: &str, value: PortValue) -> Self {
        let mut ports = BTreeMap::new();
        ports.insert(port.to_owned(), value);
        Self { ports }
    }

    pub fn get(&self, port: &str) -> Option<&PortValue> {
        self.ports.get(port)
    }

    pub fn is_empty(&self) -> bool {
        self.ports.is_empty()
    }
}

/// Values arriving at a node, keyed by target port. Most ports see exactly one edge.
#[derive(Debug, Clone, Default)]
pub struct Inbound {
    ports: BTreeMap<PortId, SmallVec<[PortValue; 1]>>,
}

impl Inbound {
    pub fn push(&mut self, port: &str, value: PortValue) {
        self.ports.entry(port.to_owned()).or_default().push(value);
    }

    pub fn values(&self, port: &str) -> &[PortValue] {
        self.ports.get(port).map(SmallVec::as_slice).unwrap_or(&[])
    }

    pub fn is_connected(&self, port: &str) -> bool {
        self.ports.contains_key(port)
    }

    /// All objects arriving on `port`, edges in order.
    pub fn stream(&self, port: &str) -> Vec<Arc<SceneObject>> {
        self.values(port)
            .iter()
            .filter_map(PortValue::as_objects)
            .flatten()
            .cloned()
            .collect()
    }

    pub fn scalar(&self, port: &str) -> Option<&Value> {
        self.values(port).iter().find_map(PortValue::as_scalar)
    }

    pub fn first(&self, port: &str) -> Option<&PortValue> {
        self.values(port).first()
    }

    pub fn ports(&self) -> impl Iterator<Item = &PortId> {
        self.ports.keys()
    }
}

/// Semantic tag of an execution log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogAction {
    ObjectCreated,
    AppearanceStamped,
    StreamFiltered,
    StreamsMerged,
    ScalarComputed,
    BranchSelected,
    ConstantEmitted,
    ResultOutput,
    TrackAttached,
    PartitionRootRegistered,
    OperationFailed,
    EdgeSkipped,
    ExecutionHalted,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub node_id: NodeId,
    pub timestamp: DateTime<Utc>,
    pub action: LogAction,
    pub data: Value,
}

/// State of one run. Created per call and thrown away afterwards.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionContext<'a> {
    #[serde(skip)]
    registries: &'a Registries,
    #[serde(skip)]
    graph: FlowGraph<'a>,
    executed: BTreeSet<NodeId>,
    execution_order: Vec<NodeId>,
    outputs: BTreeMap<NodeId, NodeOutput>,
    log: Vec<LogEntry>,
    /// Every object created this run, as first produced, by id.
    objects: BTreeMap<ObjectId, Arc<SceneObject>>,
    /// Streams received by terminal nodes.
    terminal_streams: BTreeMap<NodeId, Vec<Arc<SceneObject>>>,
    issues: Vec<Issue>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(registries: &'a Registries, graph: FlowGraph<'a>) -> Self {
        Self {
            registries,
            graph,
            executed: BTreeSet::new(),
            execution_order: Vec::new(),
            outputs: BTreeMap::new(),
            log: Vec::new(),
            objects: BTreeMap::new(),
            terminal_streams: BTreeMap::new(),
            issues: Vec::new(),
        }
    }

    pub fn registries(&self) -> &'a Registries {
        self.registries
    }

    pub fn graph(&self) -> &FlowGraph<'a> {
        &self.graph
    }

    pub fn is_executed(&self, node_id: &str) -> bool {
        self.executed.contains(node_id)
    }

    /// Node ids in the order they ran.
    pub fn execution_order(&self) -> &[NodeId] {
        &self.execution_order
    }

    pub fn output(&self, node_id: &str) -> Option<&NodeOutput> {
        self.outputs.get(node_id)
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Log entries tagged `result_output`, the entries the debugger shows.
    pub fn results(&self) -> impl Iterator<Item = &LogEntry> {
        self.log
            .iter()
            .filter(|e| e.action == LogAction::ResultOutput)
    }

    pub fn objects(&self) -> &BTreeMap<ObjectId, Arc<SceneObject>> {
        &self.objects
    }

    pub fn object(&self, id: &str) -> Option<&Arc<SceneObject>> {
        self.objects.get(id)
    }

    pub fn terminal_stream(&self, node_id: &str) -> Option<&[Arc<SceneObject>]> {
        self.terminal_streams.get(node_id).map(Vec::as_slice)
    }

    /// Terminal node ids that registered as partition roots, in execution order.
    pub fn partition_roots(&self) -> impl Iterator<Item = &NodeId> {
        self.execution_order
            .iter()
            .filter(|id| self.terminal_streams.contains_key(*id))
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    /// Resolve one field of a node through the four precedence tiers.
    pub fn resolve_field(
        &self,
        node_id: &str,
        key: &FieldKey,
        object_id: Option<&str>,
    ) -> FlowResult<Option<Resolved>> {
        let node = self
            .graph
            .get(node_id)
            .ok_or_else(|| FlowError::unknown_node(node_id))?;
        Ok(node_resolver(node, self.registries, self).resolve(key, object_id))
    }

    pub fn push_log(&mut self, node_id: &str, action: LogAction, data: Value) {
        self.log.push(LogEntry {
            node_id: node_id.to_owned(),
            timestamp: Utc::now(),
            action,
            data,
        });
    }

    pub fn push_issue(&mut self, issue: Issue) {
        tracing::warn!(code = %issue.code, node = ?issue.node_id, "{}", issue.message);
        self.issues.push(issue);
    }

    pub(crate) fn extend_issues(&mut self, issues: Vec<Issue>) {
        self.issues.extend(issues);
    }

    /// Pick an object id that is free in this run: `preferred`, then `preferred-2`, ...
    pub(crate) fn unique_object_id(&self, preferred: &str) -> ObjectId {
        if !self.objects.contains_key(preferred) {
            return preferred.to_owned();
        }
        (2..)
            .map(|n| format!("{preferred}-{n}"))
            .find(|c| !self.objects.contains_key(c))
            .unwrap_or_else(|| preferred.to_owned())
    }

    pub(crate) fn register_object(&mut self, object: Arc<SceneObject>) {
        self.objects.insert(object.id.clone(), object);
    }

    pub(crate) fn register_terminal(&mut self, node_id: &str, stream: Vec<Arc<SceneObject>>) {
        self.terminal_streams.insert(node_id.to_owned(), stream);
    }

    pub(crate) fn record(&mut self, node_id: &str, output: NodeOutput) {
        if self.executed.insert(node_id.to_owned()) {
            self.execution_order.push(node_id.to_owned());
        }
        self.outputs.insert(node_id.to_owned(), output);
    }
}

/// Bindings read the scalar a node produced, if any.
impl LiveValues for ExecutionContext<'_> {
    fn live_value(&self, node_id: &str) -> Option<&Value> {
        self.outputs
            .get(node_id)?
            .ports
            .values()
            .find_map(PortValue::as_scalar)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/context.rs"]
mod tests;
