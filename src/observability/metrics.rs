use std::sync::Arc;

use prometheus::{
    Counter, CounterVec, Gauge, Histogram, Registry, register_counter_vec_with_registry,
    register_counter_with_registry, register_gauge_with_registry,
    register_histogram_with_registry,
};

/// Counters of one scoring run.
#[derive(Debug, Clone)]
pub struct Metrics {
    pub records_fetched: Counter,
    pub records_scored: CounterVec,
    pub records_withheld: Counter,
    pub runs_failed: CounterVec,

    pub unexpected_columns: Gauge,

    pub run_duration: Histogram,
}

impl Metrics {
    /// # Errors
    /// Returns an error if a metric is already registered in `registry`.
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        Ok(Self {
            records_fetched: register_counter_with_registry!(
                "placement_records_fetched_total",
                "Assignment records returned by the record source",
                registry
            )?,
            records_scored: register_counter_vec_with_registry!(
                "placement_records_scored_total",
                "Scored assignment records by priority tier",
                &["tier"],
                registry
            )?,
            records_withheld: register_counter_with_registry!(
                "placement_records_withheld_total",
                "Records withheld from scoring because features could not be derived",
                registry
            )?,
            runs_failed: register_counter_vec_with_registry!(
                "placement_runs_failed_total",
                "Aborted runs by error kind",
                &["kind"],
                registry
            )?,
            unexpected_columns: register_gauge_with_registry!(
                "placement_unexpected_columns",
                "Observed indicator columns absent from the expected-column contract",
                registry
            )?,
            run_duration: register_histogram_with_registry!(
                "placement_run_duration_seconds",
                "Wall time of a scoring run",
                vec![0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0],
                registry
            )?,
        })
    }
}
