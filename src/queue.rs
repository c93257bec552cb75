//! Min-order key for float-weighted priority queues
//!
//! `std::collections::BinaryHeap` and `priority_queue::PriorityQueue` both
//! pop the *greatest* element, so the search weights wrap into a key with
//! inverted ordering: the smallest weight compares greatest and pops first.

use std::cmp::Ordering;

/// Scalar queue key ordering `f64` weights smallest-first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MinWeight(pub f64);

impl Eq for MinWeight {}

impl PartialOrd for MinWeight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MinWeight {
    fn cmp(&self, other: &Self) -> Ordering {
        // Inverted for min-first popping
        other.0.total_cmp(&self.0)
    }
}
