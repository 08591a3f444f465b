//! Route resolution
//!
//! Turns IP routes into coordinate routes by way of the topology index and
//! the geo table, filters them through a [`RouteValidator`] and hands the
//! survivors to a [`RouteConsumer`].
//!
//! An IP address missing from the topology only drops that hop, while a
//! node missing from the geo table drops the whole route.

mod consumer;

#[cfg(test)]
mod tests;

pub use consumer::{RouteCollector, RouteConsumer, RouteWriter, Tee};

use crate::geo::{GeoLookupError, GeoTable};
use crate::ground_truth::RouteValidator;
use crate::models::{CoordRoute, IpRoute, NodeId};
use crate::observability::{drop_reasons, PipelineMetrics};
use crate::topology::IpToNodeIndex;
use anyhow::Result;
use tracing::{debug, error, info, warn};

/// Minimum number of hops for a converted route to be kept
pub const MIN_ROUTE_HOPS: usize = 2;

/// Outcome of resolving a single IP route
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved(CoordRoute),
    /// A hop's node has no geo record
    UnknownNode(NodeId),
    /// A hop's node has a geo record without usable coordinates
    MissingCoordinates(NodeId),
    /// Fewer than two hops survived resolution
    TooShort,
}

/// Counters for one [`RouteResolver::resolve`] run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub total: usize,
    pub converted: usize,
    pub unknown_node: usize,
    pub missing_coordinates: usize,
    pub too_short: usize,
    pub rejected: usize,
    pub unmapped_hops: usize,
}

impl ResolveStats {
    /// Routes dropped for any reason
    pub fn dropped(&self) -> usize {
        self.unknown_node + self.missing_coordinates + self.too_short + self.rejected
    }
}

/// Resolves IP routes against read-only topology and geo tables
pub struct RouteResolver<'a> {
    index: &'a IpToNodeIndex,
    geo: &'a GeoTable,
}

impl<'a> RouteResolver<'a> {
    pub fn new(index: &'a IpToNodeIndex, geo: &'a GeoTable) -> Self {
        Self { index, geo }
    }

    /// Resolve one route without validation
    pub fn resolve_route(&self, route: &IpRoute) -> Resolution {
        self.resolve_hops(route).0
    }

    fn resolve_hops(&self, route: &IpRoute) -> (Resolution, usize) {
        let mut hops = Vec::with_capacity(route.len());
        let mut unmapped = 0;

        for ip in route {
            let Some(node_id) = self.index.node_of(ip) else {
                warn!(ip = %ip, "IP not found in topology, skipping hop");
                unmapped += 1;
                continue;
            };
            match self.geo.coordinate(node_id.as_str()) {
                Ok(coordinate) => hops.push(coordinate),
                Err(GeoLookupError::NotFound(_)) => {
                    error!(node_id = %node_id, ip = %ip, "Node not found in geo table, dropping route");
                    return (Resolution::UnknownNode(node_id.clone()), unmapped);
                }
                Err(GeoLookupError::MissingCoordinates(_)) => {
                    error!(node_id = %node_id, ip = %ip, "Node has no coordinates, dropping route");
                    return (Resolution::MissingCoordinates(node_id.clone()), unmapped);
                }
            }
        }

        if hops.len() < MIN_ROUTE_HOPS {
            warn!(hops = hops.len(), "Route too short after resolution, dropping");
            return (Resolution::TooShort, unmapped);
        }
        (Resolution::Resolved(CoordRoute::new(hops)), unmapped)
    }

    /// Resolve, validate and emit every route in input order
    ///
    /// Validation errors (region lookups) and consumer errors abort the run.
    pub fn resolve<'r, V, C>(
        &self,
        routes: impl IntoIterator<Item = &'r IpRoute>,
        validator: &mut V,
        consumer: &mut C,
    ) -> Result<ResolveStats>
    where
        V: RouteValidator + ?Sized,
        C: RouteConsumer + ?Sized,
    {
        let metrics = PipelineMetrics::new();
        let mut stats = ResolveStats::default();

        for route in routes {
            stats.total += 1;
            metrics.inc_routes_seen();

            let (resolution, unmapped) = self.resolve_hops(route);
            stats.unmapped_hops += unmapped;
            if unmapped > 0 {
                metrics.add_unmapped_hops(unmapped as u64);
            }

            let resolved = match resolution {
                Resolution::Resolved(resolved) => resolved,
                Resolution::UnknownNode(_) => {
                    stats.unknown_node += 1;
                    metrics.inc_routes_dropped(drop_reasons::UNKNOWN_NODE);
                    continue;
                }
                Resolution::MissingCoordinates(_) => {
                    stats.missing_coordinates += 1;
                    metrics.inc_routes_dropped(drop_reasons::MISSING_COORDINATES);
                    continue;
                }
                Resolution::TooShort => {
                    stats.too_short += 1;
                    metrics.inc_routes_dropped(drop_reasons::TOO_SHORT);
                    continue;
                }
            };

            if !validator.check(&resolved)? {
                debug!(route = %resolved.canonical(), "Route rejected by validator");
                stats.rejected += 1;
                metrics.inc_routes_dropped(drop_reasons::REJECTED);
                continue;
            }

            consumer.accept(&resolved)?;
            stats.converted += 1;
            metrics.inc_routes_converted();
        }

        consumer.finish()?;

        info!(
            converted = stats.converted,
            total = stats.total,
            dropped = stats.dropped(),
            unmapped_hops = stats.unmapped_hops,
            "Converted/Total: {}/{}",
            stats.converted,
            stats.total
        );
        Ok(stats)
    }
}
