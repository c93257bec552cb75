//! Many-to-many CH search
//!
//! Answers a full sources × targets table in one combined pass instead of
//! one search per pair:
//!
//! 1. **Prepare**: sweep backward from every target through the downward
//!    level filter, collecting the touched edges into a restricted subgraph
//!    and remembering the highest-level node seen (the rendezvous node).
//!    Reusable across source batches against the same target set.
//! 2. **Upward sweep**: one multi-tree relaxation over the full graph with
//!    all sources as parallel weight slots, so each relevant edge is paid
//!    for once instead of once per source.
//! 3. **Downward sweep**: restart the queue from the rendezvous entry and
//!    relax only inside the restricted subgraph until every target has its
//!    per-source weights.
//!
//! The queue tolerates stale copies: entries are keyed by the scalar weight
//! recorded at enqueue time, and a popped copy whose key no longer matches
//! the entry is dropped. Exact removal would need a vector comparison per
//! tree, which is what this engine exists to avoid.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::MatrixError;
use crate::filter::LevelFilter;
use crate::graph::{ChGraph, EdgeId, EdgeRef, NodeId, TraversalMode};
use crate::multi_tree::MultiTreeEntry;
use crate::queue::MinWeight;
use crate::subgraph::SubGraph;
use crate::weighting::Weighting;

/// Counters reported after a query.
#[derive(Debug, Default, Clone)]
pub struct ManyToManyStats {
    pub subgraph_nodes: usize,
    pub subgraph_edges: usize,
    pub upward_settled: usize,
    pub downward_settled: usize,
}

/// Multi-source multi-target shortest-path engine over a contraction
/// hierarchy.
///
/// One instance serves one query at a time; concurrent requests each get
/// their own instance over the shared read-only graph and weighting.
pub struct ManyToManySearch<'a> {
    graph: &'a ChGraph,
    weighting: &'a dyn Weighting,
    target_graph: SubGraph,
    best_map: FxHashMap<NodeId, MultiTreeEntry>,
    queue: BinaryHeap<(MinWeight, NodeId)>,
    top_node: Option<NodeId>,
    prepared: bool,
    num_trees: usize,
    max_visited_nodes: usize,
    stats: ManyToManyStats,
    // Scratch copies of the entry being expanded; the map cannot hand out a
    // shared borrow of it while adjacent entries are updated.
    curr_weights: Vec<f64>,
    curr_edges: Vec<Option<EdgeId>>,
    scratch_edges: Vec<EdgeRef>,
}

impl<'a> ManyToManySearch<'a> {
    pub fn new(
        graph: &'a ChGraph,
        weighting: &'a dyn Weighting,
        mode: TraversalMode,
    ) -> Result<Self, MatrixError> {
        if mode == TraversalMode::EdgeBased {
            return Err(MatrixError::EdgeBasedTraversal);
        }
        // Size hint only; the collections grow freely past it.
        let size = (graph.node_count() / 10).clamp(200, 2000);
        Ok(Self {
            graph,
            weighting,
            target_graph: SubGraph::with_capacity(size),
            best_map: FxHashMap::with_capacity_and_hasher(size, Default::default()),
            queue: BinaryHeap::with_capacity(size),
            top_node: None,
            prepared: false,
            num_trees: 0,
            max_visited_nodes: usize::MAX,
            stats: ManyToManyStats::default(),
            curr_weights: Vec::new(),
            curr_edges: Vec::new(),
            scratch_edges: Vec::new(),
        })
    }

    /// Cooperative budget for the upward sweep. Exhaustion yields partial
    /// results, never an error.
    pub fn set_max_visited_nodes(&mut self, max: usize) {
        self.max_visited_nodes = max;
    }

    pub fn stats(&self) -> &ManyToManyStats {
        &self.stats
    }

    /// Authoritative entry for `node` from the most recent query, e.g. for
    /// walking parent chains during metric extraction.
    pub fn entry(&self, node: NodeId) -> Option<&MultiTreeEntry> {
        self.best_map.get(&node)
    }

    /// Build the restricted subgraph for a target set.
    ///
    /// Explores by ascending node level, not by distance: the backward cone
    /// of a target set is a property of the hierarchy alone. Any previous
    /// preparation is fully discarded.
    pub fn prepare(&mut self, sources: &[NodeId], targets: &[NodeId]) {
        let graph = self.graph;
        self.num_trees = sources.len();
        self.target_graph.clear();
        self.top_node = None;

        let mut filter = LevelFilter::downward(graph);
        let mut level_queue: BinaryHeap<Reverse<(u32, NodeId)>> =
            BinaryHeap::with_capacity(targets.len().max(100));

        for &target in targets {
            self.target_graph.add_node(target);
            filter.track(target);
            level_queue.push(Reverse((graph.level(target), target)));
        }

        while let Some(Reverse((_, node))) = level_queue.pop() {
            for edge in graph.edges(node) {
                if !filter.accept(&edge) {
                    continue;
                }
                if self.target_graph.add_edge_reversed(&edge) {
                    level_queue.push(Reverse((graph.level(edge.adj), edge.adj)));
                }
            }
        }

        self.top_node = filter.highest_node();
        self.stats.subgraph_nodes = self.target_graph.node_count();
        self.stats.subgraph_edges = self.target_graph.edge_count();
        self.prepared = true;
        debug!(
            nodes = self.stats.subgraph_nodes,
            edges = self.stats.subgraph_edges,
            top = ?self.top_node,
            "restricted subgraph built"
        );
    }

    /// Run both sweeps and return the per-target entries, in target order.
    ///
    /// `None` means the target was not reached by any tree; a present entry
    /// can still carry unreached slots for individual sources. Requires a
    /// preceding [`prepare`](Self::prepare) with the same target set.
    pub fn calc_paths(
        &mut self,
        sources: &[NodeId],
        targets: &[NodeId],
    ) -> Vec<Option<MultiTreeEntry>> {
        let graph = self.graph;
        self.num_trees = sources.len();
        self.best_map.clear();
        self.queue.clear();
        self.stats.upward_settled = 0;
        self.stats.downward_settled = 0;

        if !self.prepared || sources.is_empty() {
            return vec![None; targets.len()];
        }

        for (i, &source) in sources.iter().enumerate() {
            // A node appearing as several sources shares one entry with one
            // slot per occurrence.
            let entry = self
                .best_map
                .entry(source)
                .or_insert_with(|| MultiTreeEntry::new(source, sources.len()));
            entry.weights[i] = 0.0;
            entry.visited = true;
            entry.queue_weight = 0.0;
            self.queue.push((MinWeight(0.0), source));
        }

        let mut up_filter = LevelFilter::upward(graph);
        while self.stats.upward_settled < self.max_visited_nodes {
            let Some((MinWeight(key), node)) = self.queue.pop() else {
                break;
            };
            let Some(entry) = self.best_map.get(&node) else {
                continue;
            };
            if entry.queue_weight != key {
                continue; // stale heap copy
            }
            self.fill_edges_upward(node, &mut up_filter);
            self.stats.upward_settled += 1;
        }

        // Every upward frontier must route over the rendezvous node before
        // anything can descend into the target cone. No entry there means
        // the source set cannot reach this target set at all.
        let Some(top) = self.top_node else {
            return vec![None; targets.len()];
        };
        let Some(top_entry) = self.best_map.get_mut(&top) else {
            debug!(top, "rendezvous node unreached, no path to any target");
            return vec![None; targets.len()];
        };
        top_entry.visited = true;
        let key = top_entry.min_weight();
        top_entry.queue_weight = key;
        self.queue.clear();
        self.queue.push((MinWeight(key), top));

        while let Some((MinWeight(key), node)) = self.queue.pop() {
            let Some(entry) = self.best_map.get(&node) else {
                continue;
            };
            if entry.queue_weight != key {
                continue;
            }
            self.fill_edges_downward(node);
            self.stats.downward_settled += 1;
        }

        debug!(
            upward = self.stats.upward_settled,
            downward = self.stats.downward_settled,
            "many-to-many sweep finished"
        );
        targets.iter().map(|&t| self.best_map.get(&t).cloned()).collect()
    }

    /// Total settled nodes across both sweep phases of the last query.
    pub fn visited_nodes(&self) -> usize {
        self.stats.upward_settled + self.stats.downward_settled
    }

    fn load_scratch(&mut self, node: NodeId) {
        let entry = &self.best_map[&node];
        self.curr_weights.clear();
        self.curr_weights.extend_from_slice(&entry.weights);
        self.curr_edges.clear();
        self.curr_edges.extend_from_slice(&entry.edges);
    }

    fn fill_edges_upward(&mut self, node: NodeId, filter: &mut LevelFilter<'_>) {
        let graph = self.graph;
        self.load_scratch(node);
        for edge in graph.edges(node) {
            if !filter.accept(&edge) {
                continue;
            }
            self.relax_upward(node, &edge);
        }
    }

    fn relax_upward(&mut self, node: NodeId, edge: &EdgeRef) {
        let num_trees = self.num_trees;
        let entry = self
            .best_map
            .entry(edge.adj)
            .or_insert_with(|| MultiTreeEntry::new(edge.adj, num_trees));

        let mut improved = false;
        let mut queue_key = 0.0;
        for i in 0..num_trees {
            let weight = self.curr_weights[i];
            if weight < 0.0 {
                continue;
            }
            let cost = self.weighting.weight(edge, self.curr_edges[i]);
            if !cost.is_finite() {
                continue;
            }
            let candidate = weight + cost;
            if entry.weights[i] < 0.0 || candidate < entry.weights[i] {
                entry.weights[i] = candidate;
                entry.edges[i] = Some(edge.id);
                entry.parents[i] = Some(node);
                improved = true;
                queue_key = candidate;
            }
        }
        if improved {
            entry.queue_weight = queue_key;
            self.queue.push((MinWeight(queue_key), edge.adj));
        }
    }

    fn fill_edges_downward(&mut self, node: NodeId) {
        self.load_scratch(node);
        self.scratch_edges.clear();
        self.scratch_edges.extend(self.target_graph.edges(node));
        for idx in 0..self.scratch_edges.len() {
            let edge = self.scratch_edges[idx];
            self.relax_downward(node, &edge);
        }
    }

    fn relax_downward(&mut self, node: NodeId, edge: &EdgeRef) {
        let num_trees = self.num_trees;
        let mut created = false;
        let entry = self.best_map.entry(edge.adj).or_insert_with(|| {
            created = true;
            let mut e = MultiTreeEntry::new(edge.adj, num_trees);
            e.visited = true;
            e
        });

        let first_touch = !created && !entry.visited;
        let mut improved = false;
        let mut queue_key = 0.0;
        for i in 0..num_trees {
            let weight = self.curr_weights[i];
            if weight < 0.0 {
                continue;
            }
            let cost = self.weighting.weight(edge, self.curr_edges[i]);
            if !cost.is_finite() {
                continue;
            }
            let candidate = weight + cost;
            if entry.weights[i] < 0.0 || candidate < entry.weights[i] {
                entry.weights[i] = candidate;
                entry.edges[i] = Some(edge.id);
                entry.parents[i] = Some(node);
                improved = true;
                queue_key = candidate;
            }
        }

        if first_touch {
            // Reached during the upward phase but never propagated here:
            // enqueue even without an improvement, otherwise the weights it
            // already carries would never descend to the targets below it.
            entry.visited = true;
            let key = entry.min_weight();
            entry.queue_weight = key;
            self.queue.push((MinWeight(key), edge.adj));
        }
        if improved {
            entry.visited = true;
            entry.queue_weight = queue_key;
            self.queue.push((MinWeight(queue_key), edge.adj));
        }
    }
}
