//! Metric extraction from search entries
//!
//! The generic weight is read straight off a tree slot. Duration and
//! distance are not tracked during the sweep; they are summed afterwards by
//! walking the slot's parent chain through the search's node map and
//! re-pricing each edge with the weighting's metric contract.

use crate::graph::ChGraph;
use crate::many_to_many::ManyToManySearch;
use crate::multi_tree::MultiTreeEntry;
use crate::weighting::Weighting;

use super::MatrixResult;

/// Fill every requested table cell covered by `targets`.
///
/// `targets` holds the per-column entries re-expanded to request order
/// (`None` for unsnapped columns); `src_rows` maps tree slots back to their
/// request rows. Cells left untouched keep the unreachable sentinel.
pub(crate) fn fill_tables(
    graph: &ChGraph,
    weighting: &dyn Weighting,
    search: &ManyToManySearch<'_>,
    targets: &[Option<&MultiTreeEntry>],
    src_rows: &[usize],
    result: &mut MatrixResult,
) {
    let n_targets = targets.len();
    let want_paths = result.durations.is_some() || result.distances.is_some();

    for (col, tree) in targets.iter().enumerate() {
        let Some(entry) = tree else { continue };
        for (slot, &row) in src_rows.iter().enumerate() {
            let Some(weight) = entry.weight(slot) else { continue };
            let cell = row * n_targets + col;
            if let Some(table) = result.weights.as_mut() {
                table[cell] = weight as f32;
            }
            if want_paths {
                let (duration, distance) = walk_path(graph, weighting, search, entry, slot);
                if let Some(table) = result.durations.as_mut() {
                    table[cell] = duration as f32;
                }
                if let Some(table) = result.distances.as_mut() {
                    table[cell] = distance as f32;
                }
            }
        }
    }
}

/// Sum duration and distance along tree `slot`'s path from the source to
/// `entry`, target-to-source over the parent chain.
fn walk_path(
    graph: &ChGraph,
    weighting: &dyn Weighting,
    search: &ManyToManySearch<'_>,
    entry: &MultiTreeEntry,
    slot: usize,
) -> (f64, f64) {
    let mut duration = 0.0;
    let mut distance = 0.0;

    let mut edge = entry.edges[slot];
    let mut parent = entry.parents[slot];
    while let (Some(edge_id), Some(parent_node)) = (edge, parent) {
        let parent_entry = search.entry(parent_node);
        let prev_edge = parent_entry.and_then(|e| e.edges[slot]);
        let edge_ref = graph.oriented(edge_id, parent_node);
        duration += weighting.duration(&edge_ref, prev_edge);
        distance += weighting.distance(&edge_ref);
        match parent_entry {
            Some(p) => {
                edge = p.edges[slot];
                parent = p.parents[slot];
            }
            None => break,
        }
    }

    (duration, distance)
}
