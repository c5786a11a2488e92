//! Store metrics collection.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Total store operations by collection, operation and outcome.
    pub const OPERATIONS_TOTAL: &str = "gig_store_operations_total";
}

/// Record a completed store operation.
pub fn record_operation(collection: &'static str, operation: &'static str, outcome: &'static str) {
    counter!(
        names::OPERATIONS_TOTAL,
        "collection" => collection,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}
