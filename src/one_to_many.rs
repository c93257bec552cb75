//! One-to-many Dijkstra baseline
//!
//! A classical single-source search over the full graph with a target set
//! registered up front and early termination once every registered target
//! has settled. Weights are single-valued here, so improving relaxations
//! use exact decrease-key on the queue instead of the lazy stale-copy
//! discipline of the multi-tree engine. Serves as the fallback when the CH
//! engine is not applicable and as the cross-validation reference.

use priority_queue::PriorityQueue;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;

use crate::error::MatrixError;
use crate::graph::{ChGraph, EdgeId, NodeId, TraversalMode};
use crate::queue::MinWeight;
use crate::weighting::Weighting;

/// Shortest-path-tree record for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SptEntry {
    pub node: NodeId,
    /// Incoming edge, `None` at the source.
    pub edge: Option<EdgeId>,
    pub weight: f64,
    pub parent: Option<NodeId>,
}

/// Single-source, multi-target Dijkstra with early stopping.
pub struct OneToManySearch<'a> {
    graph: &'a ChGraph,
    weighting: &'a dyn Weighting,
    from_map: FxHashMap<NodeId, SptEntry>,
    queue: PriorityQueue<NodeId, MinWeight>,
    registered: FxHashSet<NodeId>,
    targets_count: usize,
    targets_found: usize,
    visited_nodes: usize,
    max_visited_nodes: usize,
}

impl<'a> OneToManySearch<'a> {
    pub fn new(
        graph: &'a ChGraph,
        weighting: &'a dyn Weighting,
        mode: TraversalMode,
    ) -> Result<Self, MatrixError> {
        if mode == TraversalMode::EdgeBased {
            return Err(MatrixError::EdgeBasedTraversal);
        }
        let size = (graph.node_count() / 10).clamp(200, 2000);
        Ok(Self {
            graph,
            weighting,
            from_map: FxHashMap::with_capacity_and_hasher(size, Default::default()),
            queue: PriorityQueue::with_capacity(size),
            registered: FxHashSet::default(),
            targets_count: 0,
            targets_found: 0,
            visited_nodes: 0,
            max_visited_nodes: usize::MAX,
        })
    }

    pub fn set_max_visited_nodes(&mut self, max: usize) {
        self.max_visited_nodes = max;
    }

    /// Register the target set; reused by every following
    /// [`calc_paths`](Self::calc_paths) call.
    pub fn prepare(&mut self, targets: &[NodeId]) {
        self.registered.clear();
        self.registered.extend(targets.iter().copied());
    }

    /// Targets settled during the last search.
    pub fn found_targets(&self) -> usize {
        self.targets_found
    }

    /// Targets the last search was looking for (the source itself, when it
    /// is also a target, settles trivially and is not counted).
    pub fn targets_count(&self) -> usize {
        self.targets_count
    }

    pub fn visited_nodes(&self) -> usize {
        self.visited_nodes
    }

    /// Run the search from `source` and report, per entry of `targets`, the
    /// best tree entry or `None` when unreached.
    pub fn calc_paths(&mut self, source: NodeId, targets: &[NodeId]) -> Vec<Option<SptEntry>> {
        let graph = self.graph;
        self.from_map.clear();
        self.queue.clear();
        self.visited_nodes = 0;
        self.targets_found = 0;

        let mut remaining = self.registered.clone();
        remaining.remove(&source);
        self.targets_count = remaining.len();

        let mut curr = SptEntry { node: source, edge: None, weight: 0.0, parent: None };
        self.from_map.insert(source, curr);

        if self.targets_count > 0 {
            loop {
                self.visited_nodes += 1;
                if self.visited_nodes > self.max_visited_nodes {
                    break;
                }
                if curr.edge.is_some() && remaining.remove(&curr.node) {
                    self.targets_found += 1;
                    if self.targets_found == self.targets_count {
                        break;
                    }
                }

                for edge in graph.edges(curr.node) {
                    let cost = self.weighting.weight(&edge, curr.edge);
                    if !cost.is_finite() {
                        continue;
                    }
                    let candidate = curr.weight + cost;
                    match self.from_map.entry(edge.adj) {
                        Entry::Vacant(slot) => {
                            slot.insert(SptEntry {
                                node: edge.adj,
                                edge: Some(edge.id),
                                weight: candidate,
                                parent: Some(curr.node),
                            });
                            self.queue.push(edge.adj, MinWeight(candidate));
                        }
                        Entry::Occupied(mut slot) => {
                            let existing = slot.get_mut();
                            if existing.weight > candidate {
                                existing.edge = Some(edge.id);
                                existing.weight = candidate;
                                existing.parent = Some(curr.node);
                                // Exact decrease-key: drop the stale queue
                                // position and take the better one.
                                self.queue.push_increase(edge.adj, MinWeight(candidate));
                            }
                        }
                    }
                }

                let Some((node, _)) = self.queue.pop() else {
                    break;
                };
                curr = self.from_map[&node];
            }
        }

        targets.iter().map(|&t| self.from_map.get(&t).copied()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ChGraphBuilder;
    use crate::weighting::TableWeighting;

    fn line() -> ChGraph {
        let mut b = ChGraphBuilder::new();
        for level in 0..4 {
            b.add_node(level);
        }
        b.add_edge(0, 1);
        b.add_edge(1, 2);
        b.add_edge(2, 3);
        b.build()
    }

    #[test]
    fn weights_along_a_line() {
        let graph = line();
        let weighting = TableWeighting::new(&graph, vec![1.0, 1.0, 1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.prepare(&[1, 2, 3]);
        let res = search.calc_paths(0, &[1, 2, 3]);
        let weights: Vec<_> = res.iter().map(|e| e.unwrap().weight).collect();
        assert_eq!(weights, vec![1.0, 2.0, 3.0]);
        assert_eq!(search.found_targets(), 3);
    }

    #[test]
    fn stops_once_all_targets_settled() {
        let graph = line();
        let weighting = TableWeighting::new(&graph, vec![1.0, 1.0, 1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.prepare(&[1]);
        let res = search.calc_paths(0, &[1]);
        assert_eq!(res[0].unwrap().weight, 1.0);
        // Settled the source and the single target, nothing beyond.
        assert_eq!(search.visited_nodes(), 2);
    }

    #[test]
    fn source_in_target_set_is_free_and_uncounted() {
        let graph = line();
        let weighting = TableWeighting::new(&graph, vec![1.0, 1.0, 1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.prepare(&[0, 2]);
        let res = search.calc_paths(0, &[0, 2]);
        assert_eq!(res[0].unwrap().weight, 0.0);
        assert_eq!(res[0].unwrap().edge, None);
        assert_eq!(res[1].unwrap().weight, 2.0);
        assert_eq!(search.targets_count(), 1);
    }

    #[test]
    fn unreachable_target_is_none() {
        let mut b = ChGraphBuilder::new();
        b.add_node(0);
        b.add_node(1);
        b.add_node(2);
        b.add_edge(0, 1);
        let graph = b.build();
        let weighting = TableWeighting::new(&graph, vec![1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.prepare(&[1, 2]);
        let res = search.calc_paths(0, &[1, 2]);
        assert_eq!(res[0].unwrap().weight, 1.0);
        assert!(res[1].is_none());
        assert_eq!(search.found_targets(), 1);
    }

    #[test]
    fn budget_exhaustion_returns_partial_results() {
        let graph = line();
        let weighting = TableWeighting::new(&graph, vec![1.0, 1.0, 1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.set_max_visited_nodes(2);
        search.prepare(&[1, 3]);
        let res = search.calc_paths(0, &[1, 3]);
        assert_eq!(res[0].unwrap().weight, 1.0);
        assert!(res[1].is_none());
    }

    #[test]
    fn improving_relaxation_requeues_exactly() {
        // Two routes to node 1: direct (5.0) and via node 2 (1.0 + 1.0).
        let mut b = ChGraphBuilder::new();
        b.add_node(0);
        b.add_node(1);
        b.add_node(2);
        b.add_edge(0, 1);
        b.add_edge(0, 2);
        b.add_edge(2, 1);
        let graph = b.build();
        let weighting = TableWeighting::new(&graph, vec![5.0, 1.0, 1.0]);
        let mut search =
            OneToManySearch::new(&graph, &weighting, TraversalMode::NodeBased).unwrap();
        search.prepare(&[1]);
        let res = search.calc_paths(0, &[1]);
        let entry = res[0].unwrap();
        assert_eq!(entry.weight, 2.0);
        assert_eq!(entry.parent, Some(2));
    }
}
