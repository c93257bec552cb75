//! Many-to-many travel matrices over contraction hierarchies
//!
//! This crate answers sources × targets shortest-path tables on a road
//! network that has already been preprocessed into a contraction hierarchy:
//! every node carries an importance level, and search only traverses edges
//! that respect level ordering.
//!
//! ## Engines
//!
//! - [`ManyToManySearch`]: the matrix workhorse. Builds a restricted
//!   subgraph around the target set once, then computes all sources at the
//!   same time as parallel trees in one upward + one downward sweep, paying
//!   for each touched edge once instead of once per pair.
//! - [`OneToManySearch`]: a plain single-source Dijkstra with early
//!   stopping, used where the CH engine does not apply and as the
//!   correctness baseline.
//! - [`MatrixEngine`]: the request-level wrapper that validates location
//!   sets and assembles duration / distance / weight tables.
//!
//! Hierarchy construction, map ingestion, and cost models live outside this
//! crate: the graph arrives through [`ChGraphBuilder`] and costs through the
//! [`Weighting`] trait.
//!
//! ## Concurrency
//!
//! Engines are single-threaded and per-request; share the read-only
//! [`ChGraph`] and weighting across as many instances as needed.

pub mod error;
pub mod filter;
pub mod graph;
pub mod many_to_many;
pub mod matrix;
pub mod multi_tree;
pub mod one_to_many;
pub mod subgraph;
pub mod validate;
pub mod weighting;

mod queue;

pub use error::MatrixError;
pub use graph::{ChGraph, ChGraphBuilder, EdgeData, EdgeId, EdgeRef, NodeId, TraversalMode};
pub use many_to_many::{ManyToManySearch, ManyToManyStats};
pub use matrix::{MatrixEngine, MatrixLocations, MatrixMetrics, MatrixResult, UNREACHABLE};
pub use multi_tree::MultiTreeEntry;
pub use one_to_many::{OneToManySearch, SptEntry};
pub use subgraph::SubGraph;
pub use validate::{cross_validate, ValidationMismatch, ValidationReport};
pub use weighting::{TableWeighting, Weighting};
