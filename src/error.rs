//! Library error types
//!
//! Per-pair conditions (unsnapped locations, exhausted budgets, unreachable
//! pairs) resolve into sentinel cells and never surface here; only
//! structural misconfiguration does.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    /// Edge-based traversal keys search state per edge, which the matrix
    /// engines do not track. Raised at engine construction, before any
    /// search runs.
    #[error("edge-based traversal mode is not supported by the matrix search engines")]
    EdgeBasedTraversal,
}
