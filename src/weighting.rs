//! Pluggable edge cost functions
//!
//! The engines never look at road attributes themselves; every traversal
//! cost comes through the [`Weighting`] trait. A cost of `f64::INFINITY`
//! means "not traversable in this orientation", which is also how one-way
//! restrictions reach the searches that run without a level filter.

use crate::graph::{ChGraph, EdgeId, EdgeRef};

/// Cost model consumed by the searches.
///
/// `prev_edge` is the edge the search arrived on (`None` at a path start),
/// which lets an implementation price turns. Implementations must return
/// non-negative finite costs for traversable edges and `f64::INFINITY`
/// otherwise; the engines skip infinite candidates instead of propagating
/// them.
pub trait Weighting: Send + Sync {
    /// Generic traversal cost used for shortest-path ordering.
    fn weight(&self, edge: &EdgeRef, prev_edge: Option<EdgeId>) -> f64;

    /// Travel time in seconds, summed along a path by the metrics extractor.
    fn duration(&self, edge: &EdgeRef, prev_edge: Option<EdgeId>) -> f64;

    /// Length in meters, summed along a path by the metrics extractor.
    fn distance(&self, edge: &EdgeRef) -> f64;
}

/// Table-backed weighting: one precomputed value per edge and metric.
///
/// Respects the graph's per-direction access flags, so it is usable both
/// with the level-filtered CH sweeps and with the plain Dijkstra baseline.
pub struct TableWeighting<'g> {
    graph: &'g ChGraph,
    weights: Vec<f64>,
    durations: Vec<f64>,
    distances: Vec<f64>,
}

impl<'g> TableWeighting<'g> {
    /// Weighting where duration and distance mirror the generic weight.
    pub fn new(graph: &'g ChGraph, weights: Vec<f64>) -> Self {
        assert_eq!(weights.len(), graph.edge_count());
        let durations = weights.clone();
        let distances = weights.clone();
        Self { graph, weights, durations, distances }
    }

    /// Weighting with independent per-metric tables.
    pub fn with_metrics(
        graph: &'g ChGraph,
        weights: Vec<f64>,
        durations: Vec<f64>,
        distances: Vec<f64>,
    ) -> Self {
        assert_eq!(weights.len(), graph.edge_count());
        assert_eq!(durations.len(), graph.edge_count());
        assert_eq!(distances.len(), graph.edge_count());
        Self { graph, weights, durations, distances }
    }

    #[inline]
    fn accessible(&self, edge: &EdgeRef) -> bool {
        let data = self.graph.edge(edge.id);
        if edge.reversed {
            data.backward
        } else {
            data.forward
        }
    }
}

impl Weighting for TableWeighting<'_> {
    fn weight(&self, edge: &EdgeRef, _prev_edge: Option<EdgeId>) -> f64 {
        if self.accessible(edge) {
            self.weights[edge.id as usize]
        } else {
            f64::INFINITY
        }
    }

    fn duration(&self, edge: &EdgeRef, _prev_edge: Option<EdgeId>) -> f64 {
        if self.accessible(edge) {
            self.durations[edge.id as usize]
        } else {
            f64::INFINITY
        }
    }

    fn distance(&self, edge: &EdgeRef) -> f64 {
        self.distances[edge.id as usize]
    }
}
