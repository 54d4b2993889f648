//! Search run metrics.
//!
//! Counters are always collected; they are a handful of integer bumps per
//! expansion. Per-layer entries are opt-in through
//! [`Options::collect_layers`](crate::Options::collect_layers) since they
//! allocate one entry per BFS depth.
//!
//! ## Design notes
//!
//! - `visited` is the number of distinct configurations ever enqueued,
//!   including the root. It is bounded by `|states| * prod(len_i + 1)`.
//! - `duplicates` counts successful matches whose successor had already been
//!   visited (the dedup rule firing).

use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct SearchMetrics {
    /// Time spent inside the engine, summed over layers.
    pub total: Duration,
    /// Configurations dequeued.
    pub expanded: usize,
    /// Transitions whose vector matched.
    pub matched: usize,
    /// Matches that led to an already visited configuration.
    pub duplicates: usize,
    /// Distinct configurations enqueued, root included.
    pub visited: usize,
    /// Largest frontier observed at a layer boundary or after an expansion.
    pub peak_frontier: usize,
    /// One entry per processed layer when layer collection is enabled.
    pub layers: Vec<LayerMetrics>,
}

/// Timing and counts for one BFS layer.
#[derive(Debug, Default, Clone)]
pub struct LayerMetrics {
    /// Distance from the search root, in transitions.
    pub depth: usize,
    pub duration: Duration,
    /// Configurations dequeued in this layer.
    pub expanded: usize,
    /// New configurations enqueued for the next layer.
    pub discovered: usize,
}
