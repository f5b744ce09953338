use std::collections::BTreeSet;

use crate::eval::context::ExecutionContext;
use crate::foundation::core::NodeId;
use crate::foundation::error::FlowResult;
use crate::model::flow::{Edge, Node};
use crate::model::object::SceneObject;
use crate::registry::nodes::ExecutorKind;
use crate::resolve::{FieldKey, node_resolver};
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5ce9_e1a3_27d4_0b6f;

/// Video encode settings of a scene output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Seconds.
    pub duration: f64,
    pub background_color: String,
    pub video_preset: String,
    pub video_crf: u32,
}

/// Still image settings of a frame output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    pub background_color: String,
    pub format: String,
    pub quality: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    Scene(SceneConfig),
    Frame(FrameConfig),
}

/// Self-contained render specification rooted at one terminal node. Holds owned copies only,
/// so partitions can be changed or sent elsewhere independently of each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenePartition {
    pub scene_id: NodeId,
    pub display_name: String,
    pub config: OutputConfig,
    pub objects: Vec<SceneObject>,
}

/// 128-bit content hash of a partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionFingerprint {
    pub hi: u64,
    pub lo: u64,
}

impl std::fmt::Display for PartitionFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}

impl ScenePartition {
    /// Stable fingerprint over the partition's canonical JSON. Identical partitions hash the
    /// same, whichever run produced them.
    pub fn fingerprint(&self) -> FlowResult<PartitionFingerprint> {
        let mut h = StableHasher::new();
        serde_json::to_writer(&mut h, self)?;
        Ok(h.finish())
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn finish(self) -> PartitionFingerprint {
        let v = self.inner.digest128();
        PartitionFingerprint {
            hi: (v >> 64) as u64,
            lo: v as u64,
        }
    }
}

impl std::io::Write for StableHasher {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Split the objects of a finished run into one partition per terminal node.
///
/// A terminal sees the objects it received whose origin node lies upstream of it along
/// traversable `edges`. Terminals that see nothing, or never ran, are dropped. The caller
/// decides whether an empty result is fatal.
#[tracing::instrument(skip_all, fields(terminals = terminal_nodes.len()))]
pub fn partition_objects_by_scenes(
    ctx: &ExecutionContext<'_>,
    terminal_nodes: &[Node],
    edges: &[Edge],
) -> Vec<ScenePartition> {
    let mut partitions = Vec::new();
    for node in terminal_nodes {
        let Some(def) = ctx.registries().node_type(&node.node_type) else {
            continue;
        };
        let kind = def.executor;
        if !kind.is_terminal() {
            continue;
        }

        let upstream = upstream_of(&node.id, edges);
        let objects: Vec<SceneObject> = ctx
            .terminal_stream(&node.id)
            .unwrap_or_default()
            .iter()
            .filter(|o| upstream.contains(o.lineage.origin_node.as_str()))
            .filter(|o| ctx.object(&o.id).is_some())
            .map(|o| SceneObject::clone(o))
            .collect();
        if objects.is_empty() {
            tracing::debug!(node = %node.id, "dropping terminal without reachable objects");
            continue;
        }

        partitions.push(ScenePartition {
            scene_id: node.id.clone(),
            display_name: node.display_name().to_owned(),
            config: output_config(ctx, node, kind),
            objects,
        });
    }
    partitions
}

/// Reverse reachability from `node_id` over traversable edges.
fn upstream_of<'e>(node_id: &str, edges: &'e [Edge]) -> BTreeSet<&'e str> {
    let mut seen = BTreeSet::new();
    let mut stack = vec![node_id];
    while let Some(current) = stack.pop() {
        for e in edges
            .iter()
            .filter(|e| e.target_node_id == current && e.is_traversable())
        {
            if seen.insert(e.source_node_id.as_str()) {
                stack.push(e.source_node_id.as_str());
            }
        }
    }
    seen
}

fn output_config(ctx: &ExecutionContext<'_>, node: &Node, kind: ExecutorKind) -> OutputConfig {
    let res = node_resolver(node, ctx.registries(), ctx);
    let num = |key: &str, fallback: f64| {
        res.resolve_f64(&FieldKey::property(key), None)
            .unwrap_or(fallback)
    };
    let int = |key: &str, fallback: u32| num(key, f64::from(fallback)).round().max(0.0) as u32;
    let text = |key: &str, fallback: &str| {
        res.resolve(&FieldKey::property(key), None)
            .and_then(|r| r.value.as_str().map(str::to_owned))
            .unwrap_or_else(|| fallback.to_owned())
    };

    match kind {
        ExecutorKind::Frame => OutputConfig::Frame(FrameConfig {
            width: int("width", 1920).max(1),
            height: int("height", 1080).max(1),
            background_color: text("backgroundColor", "#000000"),
            format: text("format", "png"),
            quality: int("quality", 90).clamp(1, 100),
        }),
        _ => OutputConfig::Scene(SceneConfig {
            width: int("width", 1920).max(1),
            height: int("height", 1080).max(1),
            fps: int("fps", 60).max(1),
            duration: num("duration", 4.0).max(0.0),
            background_color: text("backgroundColor", "#000000"),
            video_preset: text("videoPreset", "medium"),
            video_crf: int("videoCrf", 18).min(51),
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compile/partition.rs"]
mod tests;
