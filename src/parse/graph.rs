//! petgraph-based directed graph view of a workflow document.

use std::collections::{HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Bfs, EdgeRef};

use super::types::{WorkflowDocument, WorkflowEdge, WorkflowNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeLabel {
    pub edge_id: String,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl EdgeLabel {
    /// Source handle, `"source"` when unnamed.
    pub fn handle(&self) -> &str {
        self.source_handle.as_deref().unwrap_or("source")
    }
}

pub struct WorkflowGraph {
    pub graph: DiGraph<String, EdgeLabel>,
    pub node_indices: HashMap<String, NodeIndex>,
    /// Edges whose source or target is not a node of the document.
    pub dangling_edges: Vec<String>,
}

impl WorkflowGraph {
    /// Build the graph view. Duplicate node ids keep their first occurrence and
    /// dangling edges are left out (and listed), so identity problems surface
    /// through the identity rules instead of breaking traversal.
    pub fn build(document: &WorkflowDocument) -> Self {
        Self::from_parts(&document.nodes, &document.edges)
    }

    /// Same as [`WorkflowGraph::build`] over a bare node/edge snapshot.
    pub fn from_parts(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();
        let mut dangling_edges = Vec::new();

        for node in nodes {
            if node_indices.contains_key(&node.id) {
                continue;
            }
            let idx = graph.add_node(node.id.clone());
            node_indices.insert(node.id.clone(), idx);
        }

        for edge in edges {
            match (node_indices.get(&edge.source), node_indices.get(&edge.target)) {
                (Some(&s), Some(&t)) => {
                    graph.add_edge(
                        s,
                        t,
                        EdgeLabel {
                            edge_id: edge.id.clone(),
                            source_handle: edge.source_handle.clone(),
                            target_handle: edge.target_handle.clone(),
                        },
                    );
                }
                _ => {
                    log::warn!(
                        "edge '{}' ({} -> {}) points outside the document",
                        edge.id,
                        edge.source,
                        edge.target
                    );
                    dangling_edges.push(edge.id.clone());
                }
            }
        }

        WorkflowGraph {
            graph,
            node_indices,
            dangling_edges,
        }
    }

    /// Id of a node sitting on a cycle, if the graph has one. Self-loops count.
    pub fn find_cycle(&self) -> Option<&str> {
        match toposort(&self.graph, None) {
            Ok(_) => None,
            Err(cycle) => Some(self.graph[cycle.node_id()].as_str()),
        }
    }

    /// Ids of every node reachable from `start` (including `start`).
    pub fn reachable_from(&self, start: &str) -> HashSet<&str> {
        let mut reachable = HashSet::new();
        let Some(&start_idx) = self.node_indices.get(start) else {
            return reachable;
        };
        let mut bfs = Bfs::new(&self.graph, start_idx);
        while let Some(nx) = bfs.next(&self.graph) {
            reachable.insert(self.graph[nx].as_str());
        }
        reachable
    }

    /// Whether `to` can be reached from `from`. A node always reaches itself.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        match (self.node_indices.get(from), self.node_indices.get(to)) {
            (Some(&a), Some(&b)) => has_path_connecting(&self.graph, a, b, None),
            _ => false,
        }
    }

    /// Nodes of `nodes` that `start` cannot reach, in document order.
    pub fn unreachable<'a>(&self, start: &str, nodes: &'a [WorkflowNode]) -> Vec<&'a WorkflowNode> {
        let reachable = self.reachable_from(start);
        nodes
            .iter()
            .filter(|n| !reachable.contains(n.id.as_str()))
            .collect()
    }

    /// Outgoing edges of `node_id` with their targets, in edge order.
    pub fn successors(&self, node_id: &str) -> Vec<(&str, &EdgeLabel)> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        // petgraph walks a node's edge list newest first.
        let mut out: Vec<(&str, &EdgeLabel)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (self.graph[e.target()].as_str(), e.weight()))
            .collect();
        out.reverse();
        out
    }

    /// One entry per incoming edge, so parallel edges repeat their source.
    pub fn predecessors(&self, node_id: &str) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(node_id) else {
            return vec![];
        };
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].as_str())
            .collect()
    }

    pub fn incoming_count(&self, node_id: &str) -> usize {
        self.predecessors(node_id).len()
    }
}
