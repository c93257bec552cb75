//! Matrix assembly
//!
//! Turns the raw per-target search entries into the numeric tables callers
//! asked for:
//!
//! - [`MatrixLocations`]: the input location sets, already snapped to node
//!   ids by the caller (`None` = could not be snapped).
//! - [`MatrixMetrics`]: bitmask of the tables to produce.
//! - [`MatrixEngine`]: validates the inputs, runs the many-to-many search
//!   on the valid subsets, and fills the tables.
//! - [`MatrixResult`]: one flat row-major `f32` table per requested metric.
//!
//! Unsnapped locations never abort a query: their rows and columns simply
//! stay at [`UNREACHABLE`].

mod engine;
mod extractor;

pub use engine::MatrixEngine;

use std::ops::BitOr;

use serde::{Deserialize, Serialize};

use crate::graph::NodeId;

/// Cell value for pairs without a path (and for unsnapped locations).
pub const UNREACHABLE: f32 = -1.0;

/// Bitmask selecting the tables a query should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixMetrics(u8);

impl MatrixMetrics {
    pub const DURATION: MatrixMetrics = MatrixMetrics(1);
    pub const DISTANCE: MatrixMetrics = MatrixMetrics(1 << 1);
    pub const WEIGHT: MatrixMetrics = MatrixMetrics(1 << 2);

    pub fn contains(self, other: MatrixMetrics) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for MatrixMetrics {
    type Output = MatrixMetrics;

    fn bitor(self, rhs: MatrixMetrics) -> MatrixMetrics {
        MatrixMetrics(self.0 | rhs.0)
    }
}

/// A location set resolved to graph nodes by the caller.
///
/// `None` marks a location that could not be snapped; it keeps its index so
/// result rows and columns line up with the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixLocations {
    node_ids: Vec<Option<NodeId>>,
}

impl MatrixLocations {
    pub fn new(node_ids: Vec<Option<NodeId>>) -> Self {
        Self { node_ids }
    }

    /// Convenience constructor for fully snapped sets.
    pub fn from_nodes(nodes: &[NodeId]) -> Self {
        Self { node_ids: nodes.iter().map(|&n| Some(n)).collect() }
    }

    pub fn len(&self) -> usize {
        self.node_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_ids.is_empty()
    }

    pub fn node_ids(&self) -> &[Option<NodeId>] {
        &self.node_ids
    }

    pub fn valid_nodes(&self) -> Vec<NodeId> {
        self.node_ids.iter().flatten().copied().collect()
    }

    pub fn has_valid_nodes(&self) -> bool {
        self.node_ids.iter().any(|n| n.is_some())
    }
}

/// Flat result tables, row-major: `cell = src_index * n_targets + dst_index`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixResult {
    n_sources: usize,
    n_targets: usize,
    pub(crate) durations: Option<Vec<f32>>,
    pub(crate) distances: Option<Vec<f32>>,
    pub(crate) weights: Option<Vec<f32>>,
}

impl MatrixResult {
    pub(crate) fn new(n_sources: usize, n_targets: usize, metrics: MatrixMetrics) -> Self {
        let table = |wanted| {
            if metrics.contains(wanted) {
                Some(vec![UNREACHABLE; n_sources * n_targets])
            } else {
                None
            }
        };
        Self {
            n_sources,
            n_targets,
            durations: table(MatrixMetrics::DURATION),
            distances: table(MatrixMetrics::DISTANCE),
            weights: table(MatrixMetrics::WEIGHT),
        }
    }

    pub fn n_sources(&self) -> usize {
        self.n_sources
    }

    pub fn n_targets(&self) -> usize {
        self.n_targets
    }

    pub fn durations(&self) -> Option<&[f32]> {
        self.durations.as_deref()
    }

    pub fn distances(&self) -> Option<&[f32]> {
        self.distances.as_deref()
    }

    pub fn weights(&self) -> Option<&[f32]> {
        self.weights.as_deref()
    }

    /// Single duration cell; `None` if durations were not requested.
    pub fn duration(&self, src: usize, dst: usize) -> Option<f32> {
        self.durations.as_ref().map(|t| t[src * self.n_targets + dst])
    }

    pub fn distance(&self, src: usize, dst: usize) -> Option<f32> {
        self.distances.as_ref().map(|t| t[src * self.n_targets + dst])
    }

    pub fn weight(&self, src: usize, dst: usize) -> Option<f32> {
        self.weights.as_ref().map(|t| t[src * self.n_targets + dst])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_combine_as_a_mask() {
        let m = MatrixMetrics::DURATION | MatrixMetrics::WEIGHT;
        assert!(m.contains(MatrixMetrics::DURATION));
        assert!(m.contains(MatrixMetrics::WEIGHT));
        assert!(!m.contains(MatrixMetrics::DISTANCE));
        assert!(m.contains(MatrixMetrics::DURATION | MatrixMetrics::WEIGHT));
    }

    #[test]
    fn locations_track_valid_subsets() {
        let locs = MatrixLocations::new(vec![Some(3), None, Some(7)]);
        assert_eq!(locs.len(), 3);
        assert!(locs.has_valid_nodes());
        assert_eq!(locs.valid_nodes(), vec![3, 7]);

        let invalid = MatrixLocations::new(vec![None, None]);
        assert!(!invalid.has_valid_nodes());
    }

    #[test]
    fn result_allocates_only_requested_tables() {
        let r = MatrixResult::new(2, 3, MatrixMetrics::DISTANCE);
        assert!(r.durations().is_none());
        assert!(r.weights().is_none());
        let d = r.distances().unwrap();
        assert_eq!(d.len(), 6);
        assert!(d.iter().all(|&v| v == UNREACHABLE));
        assert_eq!(r.distance(1, 2), Some(UNREACHABLE));
    }
}
