//! Parallel-structure analysis: nesting depth, fan-out width and malformed merges.
//!
//! The walk is a forward worklist pass from an entry node. Every node collects
//! a set of lanes; a lane is the stack of open forks (split node, branch edges
//! arrived so far) the node descends from. A split hands each child its lanes
//! extended by the fork of the connecting edge. A merge point is only
//! processed once every reachable incoming edge has delivered its lanes. It
//! then folds lanes that differ only in the branch edges of one fork into a
//! single lane, and closes every split whose branches have all arrived with
//! nothing still open beneath them. Both steps repeat to a fixed point.
//! Incomplete branches keep travelling downstream until a later merge closes
//! them, as one lane rather than one lane per branch.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::config::ValidationLimits;
use crate::error::WorkflowError;
use crate::parse::graph::{EdgeLabel, WorkflowGraph};
use crate::parse::types::{WorkflowEdge, WorkflowNode};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Fork {
    split: String,
    edges: BTreeSet<String>,
}

type Lane = Vec<Fork>;

/// Deepest nesting reached below one split node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelDepthRecord {
    pub branch_origin_node_id: String,
    /// `1 + max(depth of splits nested in its branches)`.
    pub depth: usize,
    /// The split sits directly on a merge point.
    pub is_abnormal: bool,
}

/// Outgoing edge count of one split node on one source handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FanOut {
    pub node_id: String,
    pub handle: String,
    pub width: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelAnalysis {
    pub entry_node_id: String,
    /// One record per split node, in discovery order.
    pub records: Vec<ParallelDepthRecord>,
    pub fan_outs: Vec<FanOut>,
    pub abnormal_nodes: Vec<String>,
}

impl ParallelAnalysis {
    pub fn max_depth(&self) -> usize {
        self.records.iter().map(|r| r.depth).max().unwrap_or(0)
    }

    pub fn is_abnormal(&self) -> bool {
        !self.abnormal_nodes.is_empty()
    }

    pub fn depth_of(&self, split_node_id: &str) -> Option<usize> {
        self.records
            .iter()
            .find(|r| r.branch_origin_node_id == split_node_id)
            .map(|r| r.depth)
    }

    /// Structural errors for abnormal merges, then depth, then width limits.
    pub fn violations(&self, limits: &ValidationLimits) -> Vec<WorkflowError> {
        let mut errors = Vec::new();

        for node_id in &self.abnormal_nodes {
            errors.push(WorkflowError::structural(
                "S006",
                format!(
                    "Node '{}' merges parallel branches and splits them again; \
                     insert a single-input node between the merge and the split",
                    node_id
                ),
                Some(node_id.clone()),
            ));
        }

        for record in &self.records {
            if record.depth > limits.max_parallel_depth {
                errors.push(WorkflowError::structural(
                    "S007",
                    format!(
                        "Parallel branches starting at '{}' nest {} levels deep, \
                         exceeding the limit of {}",
                        record.branch_origin_node_id, record.depth, limits.max_parallel_depth
                    ),
                    Some(record.branch_origin_node_id.clone()),
                ));
            }
        }

        for fan in &self.fan_outs {
            if fan.width > limits.max_parallel_width {
                errors.push(WorkflowError::structural(
                    "S008",
                    format!(
                        "Node '{}' fans out to {} parallel branches on handle '{}', \
                         exceeding the limit of {}",
                        fan.node_id, fan.width, fan.handle, limits.max_parallel_width
                    ),
                    Some(fan.node_id.clone()),
                ));
            }
        }

        errors
    }
}

/// Analyze every entry-category node of the snapshot.
pub fn analyze_all(nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> Vec<ParallelAnalysis> {
    nodes
        .iter()
        .filter(|n| n.is_entry())
        .map(|entry| analyze(&entry.id, nodes, edges))
        .collect()
}

/// Analyze the parallel structure reachable from `entry_id`.
pub fn analyze(entry_id: &str, nodes: &[WorkflowNode], edges: &[WorkflowEdge]) -> ParallelAnalysis {
    analyze_graph(entry_id, &WorkflowGraph::from_parts(nodes, edges))
}

/// [`analyze`] over an already built graph view.
pub fn analyze_graph(entry_id: &str, graph: &WorkflowGraph) -> ParallelAnalysis {
    let mut analysis = ParallelAnalysis {
        entry_node_id: entry_id.to_string(),
        ..Default::default()
    };
    if !graph.node_indices.contains_key(entry_id) {
        return analysis;
    }

    // Incoming edges each node must hear from before it is processed.
    let mut pending: HashMap<&str, usize> = HashMap::new();
    for source in graph.reachable_from(entry_id) {
        for (target, _) in graph.successors(source) {
            *pending.entry(target).or_insert(0) += 1;
        }
    }

    let mut inbox: HashMap<&str, BTreeSet<Lane>> = HashMap::new();
    inbox.insert(entry_id, BTreeSet::from([Lane::new()]));

    let mut split_edges: HashMap<String, BTreeSet<String>> = HashMap::new();
    let mut record_index: HashMap<String, usize> = HashMap::new();
    let mut done: HashSet<&str> = HashSet::new();
    let mut queue = VecDeque::from([entry_id]);

    while let Some(current) = queue.pop_front() {
        if !done.insert(current) {
            continue;
        }

        let lanes = absorb(inbox.remove(current).unwrap_or_default(), &split_edges);
        for lane in &lanes {
            for (i, fork) in lane.iter().enumerate() {
                if let Some(&idx) = record_index.get(&fork.split) {
                    let record = &mut analysis.records[idx];
                    record.depth = record.depth.max(lane.len() - i);
                }
            }
        }

        let outgoing = graph.successors(current);
        let is_split = outgoing.len() > 1;

        if is_split {
            let is_abnormal = graph.incoming_count(current) > 1;
            if is_abnormal {
                log::debug!("node '{}' re-splits straight out of a merge", current);
                analysis.abnormal_nodes.push(current.to_string());
            }

            split_edges.insert(
                current.to_string(),
                outgoing.iter().map(|(_, label)| label.edge_id.clone()).collect(),
            );
            record_index.insert(current.to_string(), analysis.records.len());
            analysis.records.push(ParallelDepthRecord {
                branch_origin_node_id: current.to_string(),
                depth: 1,
                is_abnormal,
            });
            analysis.fan_outs.extend(fan_out_by_handle(current, &outgoing));
        }

        for (target, label) in outgoing {
            let delivered = inbox.entry(target).or_default();
            if is_split {
                for lane in &lanes {
                    let mut lane = lane.clone();
                    lane.push(Fork {
                        split: current.to_string(),
                        edges: BTreeSet::from([label.edge_id.clone()]),
                    });
                    delivered.insert(lane);
                }
            } else {
                delivered.extend(lanes.iter().cloned());
            }

            if let Some(count) = pending.get_mut(target) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    queue.push_back(target);
                }
            }
        }
    }

    analysis
}

/// Whether `source` may gain one more outgoing edge on `handle`.
pub fn can_add_parallel_branch(
    source: &str,
    handle: Option<&str>,
    edges: &[WorkflowEdge],
    limits: &ValidationLimits,
) -> bool {
    let handle = handle.unwrap_or("source");
    let existing = edges
        .iter()
        .filter(|e| e.source == source && e.handle() == handle)
        .count();
    existing < limits.max_parallel_width
}

fn fan_out_by_handle(node_id: &str, outgoing: &[(&str, &EdgeLabel)]) -> Vec<FanOut> {
    let mut fans: Vec<FanOut> = Vec::new();
    for (_, label) in outgoing {
        match fans.iter_mut().find(|f| f.handle == label.handle()) {
            Some(fan) => fan.width += 1,
            None => fans.push(FanOut {
                node_id: node_id.to_string(),
                handle: label.handle().to_string(),
                width: 1,
            }),
        }
    }
    fans
}

/// Fold sibling lanes and close every split whose branches have all arrived,
/// deepest first, until nothing more changes.
fn absorb(lanes: BTreeSet<Lane>, split_edges: &HashMap<String, BTreeSet<String>>) -> BTreeSet<Lane> {
    let mut lanes = merge_siblings(lanes);
    while let Some(closed) = find_closable(&lanes, split_edges) {
        lanes.remove(&closed);
        lanes.insert(closed[..closed.len() - 1].to_vec());
        lanes = merge_siblings(lanes);
    }
    lanes
}

/// Union lanes that are equal except for the branch edges of one fork.
fn merge_siblings(mut lanes: BTreeSet<Lane>) -> BTreeSet<Lane> {
    loop {
        let longest = lanes.iter().map(Vec::len).max().unwrap_or(0);
        let mut changed = false;
        for position in 0..longest {
            let before = lanes.len();
            let mut groups: BTreeMap<Lane, BTreeSet<String>> = BTreeMap::new();
            let mut rest = BTreeSet::new();
            for mut lane in std::mem::take(&mut lanes) {
                if lane.len() <= position {
                    rest.insert(lane);
                    continue;
                }
                let edges = std::mem::take(&mut lane[position].edges);
                groups.entry(lane).or_default().extend(edges);
            }
            for (mut lane, edges) in groups {
                lane[position].edges = edges;
                rest.insert(lane);
            }
            changed |= rest.len() < before;
            lanes = rest;
        }
        if !changed {
            return lanes;
        }
    }
}

/// Deepest lane whose last fork holds every branch edge of its split, with no
/// longer lane still open under the same fork.
fn find_closable(
    lanes: &BTreeSet<Lane>,
    split_edges: &HashMap<String, BTreeSet<String>>,
) -> Option<Lane> {
    let mut ordered: Vec<&Lane> = lanes.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));

    ordered
        .into_iter()
        .find(|lane| {
            let Some((fork, prefix)) = lane.split_last() else {
                return false;
            };
            let depth = lane.len();
            let still_open = lanes.iter().any(|other| {
                other.len() > depth
                    && other[..depth - 1] == *prefix
                    && other[depth - 1].split == fork.split
            });
            !still_open && split_edges.get(&fork.split) == Some(&fork.edges)
        })
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fork(split: &str, edges: &[&str]) -> Fork {
        Fork {
            split: split.into(),
            edges: edges.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn splits(entries: &[(&str, &[&str])]) -> HashMap<String, BTreeSet<String>> {
        entries
            .iter()
            .map(|(s, es)| (s.to_string(), es.iter().map(|e| e.to_string()).collect()))
            .collect()
    }

    #[test]
    fn absorb_closes_complete_split() {
        let lanes = BTreeSet::from([vec![fork("x", &["e1"])], vec![fork("x", &["e2"])]]);
        let closed = absorb(lanes, &splits(&[("x", &["e1", "e2"])]));
        assert_eq!(closed, BTreeSet::from([Lane::new()]));
    }

    #[test]
    fn absorb_folds_partial_split_into_one_lane() {
        let lanes = BTreeSet::from([vec![fork("x", &["e1"])], vec![fork("x", &["e2"])]]);
        let kept = absorb(lanes, &splits(&[("x", &["e1", "e2", "e3"])]));
        assert_eq!(kept, BTreeSet::from([vec![fork("x", &["e1", "e2"])]]));
    }

    #[test]
    fn absorb_closes_nested_levels_together() {
        let lanes = BTreeSet::from([
            vec![fork("x", &["a"]), fork("y", &["c"])],
            vec![fork("x", &["a"]), fork("y", &["d"])],
            vec![fork("x", &["b"])],
        ]);
        let closed = absorb(lanes, &splits(&[("x", &["a", "b"]), ("y", &["c", "d"])]));
        assert_eq!(closed, BTreeSet::from([Lane::new()]));
    }

    #[test]
    fn outer_split_waits_for_open_inner_split() {
        let lanes = BTreeSet::from([
            vec![fork("x", &["a"]), fork("y", &["c"])],
            vec![fork("x", &["b"])],
        ]);
        let kept = absorb(lanes.clone(), &splits(&[("x", &["a", "b"]), ("y", &["c", "d"])]));
        assert_eq!(kept, lanes);
    }

    #[test]
    fn siblings_fold_only_when_the_rest_matches() {
        let lanes = BTreeSet::from([
            vec![fork("x", &["a"]), fork("y", &["c"])],
            vec![fork("x", &["b"]), fork("y", &["c"])],
            vec![fork("x", &["b"]), fork("y", &["d"])],
        ]);
        let merged = merge_siblings(lanes);
        assert_eq!(
            merged,
            BTreeSet::from([
                vec![fork("x", &["a", "b"]), fork("y", &["c"])],
                vec![fork("x", &["b"]), fork("y", &["d"])],
            ])
        );
    }
}
