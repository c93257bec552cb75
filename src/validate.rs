//! Matrix correctness validation
//!
//! Compares the many-to-many engine against the one-to-many baseline on
//! seeded random location sets. Zero tolerance beyond float rounding: every
//! cell must agree with an independent Dijkstra run, including which pairs
//! are unreachable. Rounds run in parallel, each worker holding its own
//! engine instances over the shared read-only graph.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::info;

use crate::error::MatrixError;
use crate::graph::{ChGraph, NodeId, TraversalMode};
use crate::matrix::{MatrixEngine, MatrixLocations, MatrixMetrics, UNREACHABLE};
use crate::one_to_many::OneToManySearch;
use crate::weighting::Weighting;

/// Agreement tolerance: table cells are `f32`, the baseline sums in `f64`.
const WEIGHT_EPS: f32 = 1e-3;

/// Most failures kept per report.
const MAX_FAILURES: usize = 100;

#[derive(Debug, Clone)]
pub struct ValidationMismatch {
    pub source: NodeId,
    pub target: NodeId,
    /// Matrix cell, [`UNREACHABLE`] when the engine found no path.
    pub matrix_weight: f32,
    /// Baseline weight, [`UNREACHABLE`] when Dijkstra found no path.
    pub baseline_weight: f32,
}

#[derive(Debug)]
pub struct ValidationReport {
    pub rounds: usize,
    pub pairs_checked: usize,
    pub mismatches: usize,
    pub failures: Vec<ValidationMismatch>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.mismatches == 0
    }
}

struct RoundOutcome {
    pairs: usize,
    failures: Vec<ValidationMismatch>,
}

/// Run `rounds` random matrix queries and cross-check every cell.
///
/// Location sets are drawn uniformly from the contracted core with a seeded
/// generator, so a failing seed reproduces exactly. Duplicate draws are kept:
/// repeated sources and targets are legal inputs and worth exercising.
pub fn cross_validate(
    graph: &ChGraph,
    weighting: &dyn Weighting,
    rounds: usize,
    n_sources: usize,
    n_targets: usize,
    seed: u64,
) -> Result<ValidationReport, MatrixError> {
    let core = graph.core_node_count() as u32;
    assert!(core > 0, "graph has no contracted nodes");

    let mut rng = StdRng::seed_from_u64(seed);
    let draws: Vec<(Vec<NodeId>, Vec<NodeId>)> = (0..rounds)
        .map(|_| {
            let sources = (0..n_sources).map(|_| rng.gen_range(0..core)).collect();
            let targets = (0..n_targets).map(|_| rng.gen_range(0..core)).collect();
            (sources, targets)
        })
        .collect();

    let outcomes: Result<Vec<RoundOutcome>, MatrixError> = draws
        .par_iter()
        .map(|(sources, targets)| run_round(graph, weighting, sources, targets))
        .collect();
    let outcomes = outcomes?;

    let mut report = ValidationReport {
        rounds,
        pairs_checked: 0,
        mismatches: 0,
        failures: Vec::new(),
    };
    for outcome in outcomes {
        report.pairs_checked += outcome.pairs;
        report.mismatches += outcome.failures.len();
        for failure in outcome.failures {
            if report.failures.len() < MAX_FAILURES {
                report.failures.push(failure);
            }
        }
    }

    info!(
        rounds = report.rounds,
        pairs = report.pairs_checked,
        mismatches = report.mismatches,
        "cross-validation finished"
    );
    Ok(report)
}

fn run_round(
    graph: &ChGraph,
    weighting: &dyn Weighting,
    sources: &[NodeId],
    targets: &[NodeId],
) -> Result<RoundOutcome, MatrixError> {
    let engine = MatrixEngine::new(graph, weighting);
    let result = engine.compute(
        &MatrixLocations::from_nodes(sources),
        &MatrixLocations::from_nodes(targets),
        MatrixMetrics::WEIGHT,
    )?;
    let table = result.weights().expect("weight table was requested");

    let mut baseline = OneToManySearch::new(graph, weighting, TraversalMode::NodeBased)?;
    baseline.prepare(targets);

    let mut failures = Vec::new();
    for (row, &source) in sources.iter().enumerate() {
        let entries = baseline.calc_paths(source, targets);
        for (col, (&target, entry)) in targets.iter().zip(entries.iter()).enumerate() {
            let cell = table[row * targets.len() + col];
            let reference = entry.map(|e| e.weight as f32).unwrap_or(UNREACHABLE);
            let agree = match (cell == UNREACHABLE, reference == UNREACHABLE) {
                (true, true) => true,
                (false, false) => (cell - reference).abs() <= WEIGHT_EPS,
                _ => false,
            };
            if !agree {
                failures.push(ValidationMismatch {
                    source,
                    target,
                    matrix_weight: cell,
                    baseline_weight: reference,
                });
            }
        }
    }

    Ok(RoundOutcome { pairs: sources.len() * targets.len(), failures })
}
