//! Level-ordered edge filters
//!
//! CH search never walks "down" the hierarchy: an edge is only traversed
//! when its far node sits at the same level or higher. The upward variant
//! gates the multi-source sweep over the full graph, the downward variant
//! gates the backward subgraph construction, judging accessibility against
//! the reverse orientation because those edges will later be traversed
//! toward the targets.
//!
//! Filters are cheap value types; build a fresh one per query instead of
//! resetting shared state.

use crate::graph::{ChGraph, EdgeRef, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDirection {
    Upward,
    Downward,
}

/// Edge predicate over node levels, remembering the highest-level node
/// accepted so far (the rendezvous candidate for the two sweep phases).
pub struct LevelFilter<'g> {
    graph: &'g ChGraph,
    direction: SearchDirection,
    highest: Option<(u32, NodeId)>,
}

impl<'g> LevelFilter<'g> {
    pub fn upward(graph: &'g ChGraph) -> Self {
        Self { graph, direction: SearchDirection::Upward, highest: None }
    }

    pub fn downward(graph: &'g ChGraph) -> Self {
        Self { graph, direction: SearchDirection::Downward, highest: None }
    }

    pub fn direction(&self) -> SearchDirection {
        self.direction
    }

    /// Decide whether `edge` may be traversed in this phase, updating the
    /// highest-node tracking on acceptance.
    ///
    /// Edges touching virtual splice nodes always pass so that queries whose
    /// endpoints sit mid-edge keep working.
    pub fn accept(&mut self, edge: &EdgeRef) -> bool {
        if self.graph.is_virtual(edge.base) || self.graph.is_virtual(edge.adj) {
            return true;
        }

        let data = self.graph.edge(edge.id);
        let traversable = match (self.direction, edge.reversed) {
            (SearchDirection::Upward, false) => data.forward,
            (SearchDirection::Upward, true) => data.backward,
            // Downward exploration records edges that will be walked in the
            // opposite orientation later.
            (SearchDirection::Downward, false) => data.backward,
            (SearchDirection::Downward, true) => data.forward,
        };
        if !traversable {
            return false;
        }

        if self.graph.level(edge.base) <= self.graph.level(edge.adj) {
            self.track(edge.adj);
            true
        } else {
            false
        }
    }

    /// Fold `node` into the highest-node tracking without an edge.
    ///
    /// Seeds the tracking with the target set itself, so a target-only
    /// subgraph (no expandable edges) still yields a rendezvous node.
    pub fn track(&mut self, node: NodeId) {
        if self.graph.is_virtual(node) {
            return;
        }
        let level = self.graph.level(node);
        match self.highest {
            Some((best, _)) if best >= level => {}
            _ => self.highest = Some((level, node)),
        }
    }

    /// Highest-level node accepted so far.
    pub fn highest_node(&self) -> Option<NodeId> {
        self.highest.map(|(_, node)| node)
    }
}
