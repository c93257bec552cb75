//! Top-level matrix computation

use tracing::debug;

use crate::error::MatrixError;
use crate::graph::{ChGraph, TraversalMode};
use crate::many_to_many::ManyToManySearch;
use crate::multi_tree::MultiTreeEntry;
use crate::weighting::Weighting;

use super::{extractor, MatrixLocations, MatrixMetrics, MatrixResult};

/// Orchestrates one matrix request: validates the location sets, runs the
/// many-to-many search on the valid subsets, and assembles the requested
/// tables.
///
/// Construct one engine per request; the shared graph and weighting stay
/// read-only throughout.
pub struct MatrixEngine<'a> {
    graph: &'a ChGraph,
    weighting: &'a dyn Weighting,
    max_visited_nodes: usize,
}

impl<'a> MatrixEngine<'a> {
    pub fn new(graph: &'a ChGraph, weighting: &'a dyn Weighting) -> Self {
        Self { graph, weighting, max_visited_nodes: usize::MAX }
    }

    /// Budget forwarded to the underlying search; exhaustion degrades cells
    /// to the unreachable sentinel instead of failing the request.
    pub fn set_max_visited_nodes(&mut self, max: usize) {
        self.max_visited_nodes = max;
    }

    pub fn compute(
        &self,
        sources: &MatrixLocations,
        targets: &MatrixLocations,
        metrics: MatrixMetrics,
    ) -> Result<MatrixResult, MatrixError> {
        let mut result = MatrixResult::new(sources.len(), targets.len(), metrics);

        if !sources.has_valid_nodes() || !targets.has_valid_nodes() {
            debug!("a location set has no snapped nodes, skipping the search");
            return Ok(result);
        }

        let src_ids = sources.valid_nodes();
        let dst_ids = targets.valid_nodes();

        let mut search =
            ManyToManySearch::new(self.graph, self.weighting, TraversalMode::NodeBased)?;
        search.set_max_visited_nodes(self.max_visited_nodes);
        search.prepare(&src_ids, &dst_ids);
        let trees = search.calc_paths(&src_ids, &dst_ids);

        // Spread the compacted results back over the requested indices:
        // unsnapped columns get no entry, unsnapped rows no slot.
        let mut expanded: Vec<Option<&MultiTreeEntry>> = Vec::with_capacity(targets.len());
        let mut next = 0;
        for id in targets.node_ids() {
            if id.is_some() {
                expanded.push(trees[next].as_ref());
                next += 1;
            } else {
                expanded.push(None);
            }
        }
        let src_rows: Vec<usize> = sources
            .node_ids()
            .iter()
            .enumerate()
            .filter_map(|(row, id)| id.map(|_| row))
            .collect();

        extractor::fill_tables(self.graph, self.weighting, &search, &expanded, &src_rows, &mut result);

        debug!(
            sources = sources.len(),
            targets = targets.len(),
            visited = search.visited_nodes(),
            "matrix computed"
        );
        Ok(result)
    }
}
