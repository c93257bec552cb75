//! Restricted target subgraph
//!
//! Built once per target set by sweeping backward from every target through
//! the downward level filter. Only the edges discovered that way exist here,
//! stored already re-oriented for the later top-to-target sweep: an edge
//! discovered while expanding node `u` up to node `v` is filed under `v`,
//! pointing back down at `u`.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::graph::{EdgeId, EdgeRef, NodeId};

#[derive(Debug, Clone, Copy)]
struct SubEdge {
    adj: NodeId,
    edge: EdgeId,
    reversed: bool,
}

/// Adjacency-list subgraph with de-duplicated edge insertion.
#[derive(Default)]
pub struct SubGraph {
    adjacency: FxHashMap<NodeId, Vec<SubEdge>>,
    seen: FxHashSet<(NodeId, EdgeId)>,
    edge_count: usize,
}

impl SubGraph {
    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            adjacency: FxHashMap::with_capacity_and_hasher(nodes, Default::default()),
            seen: FxHashSet::with_capacity_and_hasher(nodes, Default::default()),
            edge_count: 0,
        }
    }

    pub fn clear(&mut self) {
        self.adjacency.clear();
        self.seen.clear();
        self.edge_count = 0;
    }

    /// Register `node` with an empty edge list.
    ///
    /// Marks a target as present even when nothing expands from it.
    pub fn add_node(&mut self, node: NodeId) {
        self.adjacency.entry(node).or_default();
    }

    /// File `edge` under its far node, re-oriented to point back at the base.
    ///
    /// Returns whether the edge was new; a second discovery of the same edge
    /// under the same node is a no-op.
    pub fn add_edge_reversed(&mut self, edge: &EdgeRef) -> bool {
        if !self.seen.insert((edge.adj, edge.id)) {
            return false;
        }
        self.adjacency.entry(edge.adj).or_default().push(SubEdge {
            adj: edge.base,
            edge: edge.id,
            reversed: !edge.reversed,
        });
        self.edge_count += 1;
        true
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.adjacency.contains_key(&node)
    }

    /// Edges leaving `base` toward the targets.
    pub fn edges(&self, base: NodeId) -> impl Iterator<Item = EdgeRef> + '_ {
        self.adjacency
            .get(&base)
            .into_iter()
            .flatten()
            .map(move |se| EdgeRef { id: se.edge, base, adj: se.adj, reversed: se.reversed })
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }
}
