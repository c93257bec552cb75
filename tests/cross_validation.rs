//! Cross-validation of the many-to-many engine against plain Dijkstra
//!
//! Builds random strongly connected graphs, contracts them witness-less
//! (every surviving in/out neighbor pair of a contracted node gets a
//! shortcut), and checks full weight matrices against independent
//! one-to-many runs. Zero tolerance for disagreement beyond float rounding.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use butterfly_matrix::{
    cross_validate, ChGraph, ChGraphBuilder, MatrixEngine, MatrixLocations, MatrixMetrics,
    TableWeighting,
};

fn upsert(edges: &mut HashMap<(u32, u32), f64>, u: u32, v: u32, w: f64) {
    if u == v {
        return;
    }
    let slot = edges.entry((u, v)).or_insert(f64::INFINITY);
    if w < *slot {
        *slot = w;
    }
}

/// Witness-less contraction in node order (node id doubles as level): when
/// node v goes, every surviving in-neighbor gets a shortcut to every
/// surviving out-neighbor. Keeping only the cheapest parallel edge is
/// enough for a distance-preserving hierarchy.
fn contract_in_level_order(edges: &mut HashMap<(u32, u32), f64>, n: u32) {
    for v in 0..n {
        let ins: Vec<(u32, f64)> = edges
            .iter()
            .filter(|(&(a, b), _)| b == v && a > v)
            .map(|(&(a, _), &w)| (a, w))
            .collect();
        let outs: Vec<(u32, f64)> = edges
            .iter()
            .filter(|(&(a, b), _)| a == v && b > v)
            .map(|(&(_, b), &w)| (b, w))
            .collect();
        for &(u, wu) in &ins {
            for &(w_node, ww) in &outs {
                upsert(edges, u, w_node, wu + ww);
            }
        }
    }
}

/// Materialize the contracted edge map as a graph plus its weight table.
fn build(edges: HashMap<(u32, u32), f64>, n: u32) -> (ChGraph, Vec<f64>) {
    let mut builder = ChGraphBuilder::new();
    for level in 0..n {
        builder.add_node(level);
    }
    let mut sorted: Vec<((u32, u32), f64)> = edges.into_iter().collect();
    sorted.sort_by_key(|&((u, v), _)| (u, v));
    let mut weights = Vec::with_capacity(sorted.len());
    for ((u, v), w) in sorted {
        builder.add_edge(u, v);
        weights.push(w);
    }
    (builder.build(), weights)
}

/// Random strongly connected hierarchy: a bidirectional ring keeps every
/// node reachable, extra one-way edges add shortcut-worthy structure.
fn random_hierarchy(n: u32, extra_edges: usize, seed: u64) -> (ChGraph, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges: HashMap<(u32, u32), f64> = HashMap::new();

    for i in 0..n {
        let j = (i + 1) % n;
        upsert(&mut edges, i, j, rng.gen_range(1.0..10.0));
        upsert(&mut edges, j, i, rng.gen_range(1.0..10.0));
    }
    for _ in 0..extra_edges {
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        let w = rng.gen_range(1.0..25.0);
        upsert(&mut edges, u, v, w);
    }

    contract_in_level_order(&mut edges, n);
    build(edges, n)
}

#[test]
fn random_hierarchies_agree_with_dijkstra() {
    for (graph_seed, query_seed) in [(11u64, 21u64), (12, 22), (13, 23)] {
        let (graph, weights) = random_hierarchy(60, 90, graph_seed);
        let weighting = TableWeighting::new(&graph, weights);

        let report = cross_validate(&graph, &weighting, 6, 5, 7, query_seed)
            .expect("node-based validation cannot fail to start");

        assert_eq!(report.pairs_checked, 6 * 5 * 7);
        assert!(
            report.passed(),
            "graph seed {graph_seed}: {} of {} pairs disagree, first: {:?}",
            report.mismatches,
            report.pairs_checked,
            report.failures.first()
        );
    }
}

#[test]
fn bigger_sets_and_duplicate_locations_agree() {
    let (graph, weights) = random_hierarchy(120, 220, 7);
    let weighting = TableWeighting::new(&graph, weights);

    let report = cross_validate(&graph, &weighting, 4, 16, 12, 99)
        .expect("node-based validation cannot fail to start");
    assert!(
        report.passed(),
        "{} of {} pairs disagree, first: {:?}",
        report.mismatches,
        report.pairs_checked,
        report.failures.first()
    );
}

#[test]
fn full_matrix_is_symmetric_for_symmetric_weights() {
    let mut rng = StdRng::seed_from_u64(5);
    let n = 24u32;
    let mut edges: HashMap<(u32, u32), f64> = HashMap::new();
    for i in 0..n {
        let j = (i + 1) % n;
        let w = rng.gen_range(1.0..5.0);
        upsert(&mut edges, i, j, w);
        upsert(&mut edges, j, i, w);
    }
    contract_in_level_order(&mut edges, n);
    let (graph, weights) = build(edges, n);
    let weighting = TableWeighting::new(&graph, weights);

    let nodes: Vec<u32> = vec![0, 5, 11, 17, 23];
    let locations = MatrixLocations::from_nodes(&nodes);
    let engine = MatrixEngine::new(&graph, &weighting);
    let result = engine
        .compute(&locations, &locations, MatrixMetrics::WEIGHT)
        .unwrap();
    let table = result.weights().unwrap();

    let k = nodes.len();
    for a in 0..k {
        assert_eq!(table[a * k + a], 0.0, "self distance of node {}", nodes[a]);
        for b in 0..k {
            let diff = (table[a * k + b] - table[b * k + a]).abs();
            assert!(diff <= 1e-3, "asymmetry between {a} and {b}: {diff}");
        }
    }
}
