//! Route metrics
//!
//! Computes per-route scalars (hop count, geodesic length) and aggregates
//! identical routes into frequency-ranked distributions. Pairwise hop
//! distances are memoized in a [`DistanceCache`] owned by the engine.

mod distribution;
mod geodesic;

pub use distribution::{distribution, write_distribution, DistributionRow};
pub use geodesic::geodesic_km;

use crate::literal::{parse_canonical_route, LiteralError};
use crate::models::{CoordRoute, Coordinate};
use crate::observability::{caches, PipelineMetrics};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Metrics that can be derived from a coordinate route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMetric {
    HopCount,
    DistanceKm,
}

impl RouteMetric {
    pub const ALL: [RouteMetric; 2] = [RouteMetric::HopCount, RouteMetric::DistanceKm];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMetric::HopCount => "hop_count",
            RouteMetric::DistanceKm => "distance_km",
        }
    }
}

impl fmt::Display for RouteMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown route metric '{0}' (expected hop_count or distance_km)")]
pub struct UnknownMetric(pub String);

impl FromStr for RouteMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RouteMetric::ALL
            .into_iter()
            .find(|metric| metric.as_str() == s)
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}

/// Value of a route metric, rendered the way it appears in TSV output
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Count(usize),
    Km(f64),
}

impl MetricValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            MetricValue::Count(n) => *n as f64,
            MetricValue::Km(km) => *km,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{n}"),
            MetricValue::Km(km) => write!(f, "{km:?}"),
        }
    }
}

/// Round to two decimal places
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Unbounded memo of pairwise distances keyed by the ordered hop pair
///
/// Lives as long as its owner; the coordinate space is small compared to
/// the number of routes, so entries are never evicted.
#[derive(Default)]
pub struct DistanceCache {
    distances: HashMap<(Coordinate, Coordinate), f64>,
    hits: u64,
    misses: u64,
}

impl DistanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distance between two hops in kilometers, computed once per pair
    pub fn distance_km(&mut self, from: Coordinate, to: Coordinate) -> f64 {
        let metrics = PipelineMetrics::new();
        if let Some(km) = self.distances.get(&(from, to)) {
            self.hits += 1;
            metrics.inc_cache_hit(caches::DISTANCE);
            return *km;
        }
        self.misses += 1;
        metrics.inc_cache_miss(caches::DISTANCE);
        let km = geodesic_km(from, to);
        self.distances.insert((from, to), km);
        km
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.distances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    pub fn clear(&mut self) {
        self.distances.clear();
    }
}

/// Computes route metrics, owning the pairwise distance memo
#[derive(Default)]
pub struct MetricEngine {
    distances: DistanceCache,
}

impl MetricEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn distance_cache(&self) -> &DistanceCache {
        &self.distances
    }

    /// Sum of consecutive hop distances in kilometers, unrounded
    pub fn total_distance_km(&mut self, route: &CoordRoute) -> f64 {
        route
            .hops()
            .windows(2)
            .map(|pair| self.distances.distance_km(pair[0], pair[1]))
            .sum()
    }

    /// Metric of an already parsed route
    pub fn route_metric(&mut self, route: &CoordRoute, kind: RouteMetric) -> MetricValue {
        match kind {
            RouteMetric::HopCount => MetricValue::Count(route.len()),
            RouteMetric::DistanceKm => MetricValue::Km(round_km(self.total_distance_km(route))),
        }
    }

    /// Metric of a canonical route string (`(a, b)|(c, d)`)
    ///
    /// The hop count is the number of `|`-separated tokens and does not
    /// require the tokens to parse.
    pub fn metric(&mut self, canonical: &str, kind: RouteMetric) -> Result<MetricValue, LiteralError> {
        match kind {
            RouteMetric::HopCount => Ok(MetricValue::Count(canonical.split('|').count())),
            RouteMetric::DistanceKm => {
                let route = parse_canonical_route(canonical)?;
                Ok(self.route_metric(&route, kind))
            }
        }
    }
}
