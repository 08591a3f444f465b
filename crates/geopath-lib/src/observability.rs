//! Observability infrastructure for the resolution pipeline
//!
//! Provides:
//! - Prometheus counters for loaded datasets, route outcomes and cache usage
//! - Text exposition of the default registry for `--metrics-out`

use prometheus::{
    register_int_counter, register_int_counter_vec, Encoder, IntCounter, IntCounterVec,
    TextEncoder,
};
use std::sync::OnceLock;

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<PipelineMetricsInner> = OnceLock::new();

/// Reasons a route is dropped, used as the `reason` label
pub mod drop_reasons {
    pub const UNKNOWN_NODE: &str = "unknown_node";
    pub const MISSING_COORDINATES: &str = "missing_coordinates";
    pub const TOO_SHORT: &str = "too_short";
    pub const REJECTED: &str = "rejected_by_ground_truth";
}

/// Caches reporting hits and misses, used as the `cache` label
pub mod caches {
    pub const DISTANCE: &str = "distance";
    pub const REGION: &str = "region";
}

struct PipelineMetricsInner {
    topology_nodes_loaded: IntCounter,
    geo_records_loaded: IntCounter,
    routes_seen: IntCounter,
    routes_converted: IntCounter,
    routes_dropped: IntCounterVec,
    unmapped_hops: IntCounter,
    cache_hits: IntCounterVec,
    cache_misses: IntCounterVec,
}

impl PipelineMetricsInner {
    fn new() -> Self {
        Self {
            topology_nodes_loaded: register_int_counter!(
                "geopath_topology_nodes_loaded_total",
                "Topology nodes read from ITDK nodes files"
            )
            .expect("Failed to register topology_nodes_loaded"),

            geo_records_loaded: register_int_counter!(
                "geopath_geo_records_loaded_total",
                "Node geo records read from ITDK geo files"
            )
            .expect("Failed to register geo_records_loaded"),

            routes_seen: register_int_counter!(
                "geopath_routes_seen_total",
                "IP routes submitted for resolution"
            )
            .expect("Failed to register routes_seen"),

            routes_converted: register_int_counter!(
                "geopath_routes_converted_total",
                "Routes resolved to coordinates and accepted"
            )
            .expect("Failed to register routes_converted"),

            routes_dropped: register_int_counter_vec!(
                "geopath_routes_dropped_total",
                "Routes discarded during resolution",
                &["reason"]
            )
            .expect("Failed to register routes_dropped"),

            unmapped_hops: register_int_counter!(
                "geopath_unmapped_hops_total",
                "Hop addresses without a topology node"
            )
            .expect("Failed to register unmapped_hops"),

            cache_hits: register_int_counter_vec!(
                "geopath_cache_hits_total",
                "Memoized lookups served from cache",
                &["cache"]
            )
            .expect("Failed to register cache_hits"),

            cache_misses: register_int_counter_vec!(
                "geopath_cache_misses_total",
                "Memoized lookups that had to be computed",
                &["cache"]
            )
            .expect("Failed to register cache_misses"),
        }
    }
}

/// Pipeline metrics for Prometheus exposition
///
/// This is a lightweight handle to the global metrics instance.
/// Multiple clones share the same underlying metrics.
#[derive(Clone)]
pub struct PipelineMetrics {
    _private: (),
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineMetrics {
    /// Create a new metrics handle (initializes global metrics if needed)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(PipelineMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &PipelineMetricsInner {
        GLOBAL_METRICS.get().expect("Metrics not initialized")
    }

    pub fn add_topology_nodes(&self, count: u64) {
        self.inner().topology_nodes_loaded.inc_by(count);
    }

    pub fn add_geo_records(&self, count: u64) {
        self.inner().geo_records_loaded.inc_by(count);
    }

    pub fn inc_routes_seen(&self) {
        self.inner().routes_seen.inc();
    }

    pub fn inc_routes_converted(&self) {
        self.inner().routes_converted.inc();
    }

    /// Count a dropped route; `reason` is one of [`drop_reasons`]
    pub fn inc_routes_dropped(&self, reason: &str) {
        self.inner()
            .routes_dropped
            .with_label_values(&[reason])
            .inc();
    }

    pub fn add_unmapped_hops(&self, count: u64) {
        self.inner().unmapped_hops.inc_by(count);
    }

    /// Count a cache hit; `cache` is one of [`caches`]
    pub fn inc_cache_hit(&self, cache: &str) {
        self.inner().cache_hits.with_label_values(&[cache]).inc();
    }

    /// Count a cache miss; `cache` is one of [`caches`]
    pub fn inc_cache_miss(&self, cache: &str) {
        self.inner().cache_misses.with_label_values(&[cache]).inc();
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
