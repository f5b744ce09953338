use std::collections::{BTreeSet, HashMap, VecDeque};

use crate::foundation::error::{FlowError, FlowResult};
use crate::model::flow::{Edge, Node};

/// Adjacency index over a node/edge list.
///
/// Edges whose endpoints are not in `nodes` are left out of the index; validators report them.
/// Variable bindings count as dependencies too: a node runs after every result node it binds to.
#[derive(Debug, Clone)]
pub struct FlowGraph<'a> {
    nodes: &'a [Node],
    edges: &'a [Edge],
    index: HashMap<&'a str, usize>,
    incoming: Vec<Vec<usize>>,
    outgoing: Vec<Vec<usize>>,
    /// Binding targets of each node.
    bound: Vec<Vec<usize>>,
    /// Nodes binding to each node.
    binders: Vec<Vec<usize>>,
}

impl<'a> FlowGraph<'a> {
    pub fn new(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, n) in nodes.iter().enumerate() {
            index.entry(n.id.as_str()).or_insert(i);
        }
        let mut incoming = vec![Vec::new(); nodes.len()];
        let mut outgoing = vec![Vec::new(); nodes.len()];
        for (ei, e) in edges.iter().enumerate() {
            let (Some(&s), Some(&t)) = (
                index.get(e.source_node_id.as_str()),
                index.get(e.target_node_id.as_str()),
            ) else {
                continue;
            };
            outgoing[s].push(ei);
            incoming[t].push(ei);
        }
        let mut bound = vec![Vec::new(); nodes.len()];
        let mut binders = vec![Vec::new(); nodes.len()];
        for (i, n) in nodes.iter().enumerate() {
            for (_, _, b) in n.data.bindings.iter() {
                let Some(&t) = index.get(b.bound_result_node_id.as_str()) else {
                    continue;
                };
                if !bound[i].contains(&t) {
                    bound[i].push(t);
                    binders[t].push(i);
                }
            }
        }
        Self {
            nodes,
            edges,
            index,
            incoming,
            outgoing,
            bound,
            binders,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &'a [Node] {
        self.nodes
    }

    /// Every edge, including ones the index left out.
    pub fn edges(&self) -> &'a [Edge] {
        self.edges
    }

    pub fn node(&self, idx: usize) -> &'a Node {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Edges entering node `idx`, in input order.
    pub fn incoming(&self, idx: usize) -> impl Iterator<Item = &'a Edge> + '_ {
        self.incoming[idx].iter().map(|&e| &self.edges[e])
    }

    /// Edges leaving node `idx`, in input order.
    pub fn outgoing(&self, idx: usize) -> impl Iterator<Item = &'a Edge> + '_ {
        self.outgoing[idx].iter().map(|&e| &self.edges[e])
    }

    /// Kahn ordering over edges and binding dependencies. Among ready nodes the one listed first
    /// in the input wins, so the order is deterministic for a given node list.
    pub fn topological_order(&self) -> FlowResult<Vec<usize>> {
        let mut indegree: Vec<usize> = (0..self.len())
            .map(|i| self.incoming[i].len() + self.bound[i].len())
            .collect();
        let mut ready: BTreeSet<usize> = (0..self.len()).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(self.len());

        while let Some(i) = ready.pop_first() {
            order.push(i);
            let edge_targets = self.outgoing[i]
                .iter()
                .filter_map(|&ei| self.index.get(self.edges[ei].target_node_id.as_str()).copied());
            for t in edge_targets.chain(self.binders[i].iter().copied()) {
                indegree[t] -= 1;
                if indegree[t] == 0 {
                    ready.insert(t);
                }
            }
        }

        if order.len() < self.len() {
            let stuck = (0..self.len())
                .filter(|&i| indegree[i] > 0)
                .map(|i| self.nodes[i].id.as_str());
            return Err(FlowError::cycle(stuck));
        }
        Ok(order)
    }

    /// Every node that has to run before `idx`: edge sources and binding targets, transitively
    /// (excluding `idx` unless it sits on a cycle).
    pub fn ancestors(&self, idx: usize) -> BTreeSet<usize> {
        self.walk(idx, |g, i| {
            g.incoming[i]
                .iter()
                .filter_map(|&e| g.index_of(&g.edges[e].source_node_id))
                .chain(g.bound[i].iter().copied())
                .collect()
        })
    }

    /// Every node upstream of `idx` over edges alone.
    pub fn edge_ancestors(&self, idx: usize) -> BTreeSet<usize> {
        self.walk(idx, |g, i| {
            g.incoming[i]
                .iter()
                .filter_map(|&e| g.index_of(&g.edges[e].source_node_id))
                .collect()
        })
    }

    fn walk(&self, start: usize, next: impl Fn(&Self, usize) -> Vec<usize>) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([start]);
        while let Some(i) = queue.pop_front() {
            for n in next(self, i) {
                if seen.insert(n) {
                    queue.push_back(n);
                }
            }
        }
        seen
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/mod.rs"]
mod tests;
