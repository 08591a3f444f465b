//! Geographic resolution of traceroute paths between cloud regions
//!
//! This crate provides the core functionality for:
//! - Loading the ITDK router topology and node geolocation tables
//! - Resolving IP routes into coordinate routes
//! - Filtering routes by ground-truth cloud region endpoints
//! - Route metrics and frequency distributions
//! - Cloud IP ranges and per-region-pair TSV merging

pub mod cloud;
pub mod combine;
pub mod filename;
pub mod geo;
pub mod ground_truth;
pub mod literal;
pub mod models;
pub mod observability;
pub mod resolver;
pub mod route_metrics;
pub mod topology;

pub use crate::geo::{GeoLookupError, GeoRecord, GeoTable};
pub use ground_truth::{
    make_validator, AcceptAll, CarbonApiClient, GroundTruth, GroundTruthError, LookupError,
    RegionCache, RegionLookup, RouteValidator,
};
pub use models::*;
pub use observability::PipelineMetrics;
pub use resolver::{Resolution, ResolveStats, RouteConsumer, RouteResolver};
pub use route_metrics::{MetricEngine, MetricValue, RouteMetric};
pub use topology::{load_topology, IpToNodeIndex, NodeToIpsIndex, TopologyIndex};
