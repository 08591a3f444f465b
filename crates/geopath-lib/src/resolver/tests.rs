//! Tests for route resolution, validation and consumers

use super::*;
use crate::ground_truth::{AcceptAll, LookupError};
use crate::literal::read_coordinate_routes_from;
use crate::models::Coordinate;
use crate::topology::read_topology;

const NODES: &str = "# ITDK nodes\n\
node N1:  10.0.0.1 10.0.0.2\n\
node N2:  10.0.1.1\n\
node N3:  10.0.2.1\n\
node N4:  10.0.3.1\n\
node N5:  10.0.4.1\n";

const GEO: &str = "# node_id\tcontinent\tcountry\tregion\tcity\tlat\tlong\n\
node.geo N1:\tAF\tZA\t11\tJohannesburg\t-26.2\t28.05\tpop\tIX\tsrc\n\
node.geo N2:\tEU\tGB\tENG\tLondon\t51.5\t-0.12\n\
node.geo N3:\tAS\tJP\t27\tOsaka\t34.69\t135.5\n\
node.geo N4:\tAS\tJP\t13\tTokyo\t\t\n";

fn fixtures() -> (IpToNodeIndex, GeoTable) {
    let index = read_topology::<IpToNodeIndex>(NODES.as_bytes()).unwrap();
    let geo = GeoTable::from_reader(GEO.as_bytes()).unwrap();
    (index, geo)
}

fn ip_route(ips: &[&str]) -> IpRoute {
    ips.iter().map(|ip| ip.to_string()).collect()
}

const JOHANNESBURG: Coordinate = Coordinate { lat: -26.2, lon: 28.05 };
const LONDON: Coordinate = Coordinate { lat: 51.5, lon: -0.12 };
const OSAKA: Coordinate = Coordinate { lat: 34.69, lon: 135.5 };

/// Accepts routes that start south of the equator
struct SouthernStart;

impl RouteValidator for SouthernStart {
    fn check(&mut self, route: &CoordRoute) -> Result<bool, LookupError> {
        Ok(route.first().is_some_and(|c| c.lat < 0.0))
    }
}

struct FailingValidator;

impl RouteValidator for FailingValidator {
    fn check(&mut self, route: &CoordRoute) -> Result<bool, LookupError> {
        Err(LookupError::NoRegion(route.hops()[0]))
    }
}

mod resolve_route_tests {
    use super::*;

    #[test]
    fn test_resolves_all_hops() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let resolution = resolver.resolve_route(&ip_route(&["10.0.0.1", "10.0.1.1", "10.0.2.1"]));
        assert_eq!(
            resolution,
            Resolution::Resolved(CoordRoute::new(vec![JOHANNESBURG, LONDON, OSAKA]))
        );
    }

    #[test]
    fn test_unmapped_ip_drops_only_that_hop() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let resolution = resolver.resolve_route(&ip_route(&["10.0.0.2", "192.0.2.1", "10.0.2.1"]));
        assert_eq!(
            resolution,
            Resolution::Resolved(CoordRoute::new(vec![JOHANNESBURG, OSAKA]))
        );
    }

    #[test]
    fn test_node_without_geo_record_drops_route() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let resolution = resolver.resolve_route(&ip_route(&["10.0.0.1", "10.0.4.1", "10.0.2.1"]));
        assert_eq!(resolution, Resolution::UnknownNode(NodeId::new("N5")));
    }

    #[test]
    fn test_node_without_coordinates_drops_route() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let resolution = resolver.resolve_route(&ip_route(&["10.0.0.1", "10.0.3.1"]));
        assert_eq!(resolution, Resolution::MissingCoordinates(NodeId::new("N4")));
    }

    #[test]
    fn test_short_routes() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        assert_eq!(resolver.resolve_route(&ip_route(&[])), Resolution::TooShort);
        assert_eq!(
            resolver.resolve_route(&ip_route(&["10.0.0.1"])),
            Resolution::TooShort
        );
        assert_eq!(
            resolver.resolve_route(&ip_route(&["10.0.0.1", "198.51.100.7"])),
            Resolution::TooShort
        );
    }

    #[test]
    fn test_repeated_node_keeps_duplicate_hops() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let resolution = resolver.resolve_route(&ip_route(&["10.0.0.1", "10.0.0.2"]));
        assert_eq!(
            resolution,
            Resolution::Resolved(CoordRoute::new(vec![JOHANNESBURG, JOHANNESBURG]))
        );
    }
}

mod pipeline_tests {
    use super::*;

    fn routes() -> Vec<IpRoute> {
        vec![
            ip_route(&["10.0.0.1", "10.0.1.1", "10.0.2.1"]),
            ip_route(&["10.0.2.1", "203.0.113.9", "10.0.0.1"]),
            ip_route(&["10.0.0.1", "10.0.4.1"]),
            ip_route(&["10.0.0.1", "10.0.3.1"]),
            ip_route(&["10.0.1.1"]),
            ip_route(&["10.0.0.2", "10.0.2.1"]),
        ]
    }

    #[test]
    fn test_resolve_collects_in_input_order() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut collector = RouteCollector::new();

        let stats = resolver
            .resolve(&routes(), &mut AcceptAll, &mut collector)
            .unwrap();

        assert_eq!(
            stats,
            ResolveStats {
                total: 6,
                converted: 3,
                unknown_node: 1,
                missing_coordinates: 1,
                too_short: 1,
                rejected: 0,
                unmapped_hops: 1,
            }
        );
        assert_eq!(stats.dropped(), 3);
        assert_eq!(
            collector.routes(),
            &[
                CoordRoute::new(vec![JOHANNESBURG, LONDON, OSAKA]),
                CoordRoute::new(vec![OSAKA, JOHANNESBURG]),
                CoordRoute::new(vec![JOHANNESBURG, OSAKA]),
            ]
        );
    }

    #[test]
    fn test_validator_rejections_are_counted() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut collector = RouteCollector::new();

        let stats = resolver
            .resolve(&routes(), &mut SouthernStart, &mut collector)
            .unwrap();

        assert_eq!(stats.converted, 2);
        assert_eq!(stats.rejected, 1);
        assert!(collector
            .into_routes()
            .iter()
            .all(|route| route.hops()[0] == JOHANNESBURG));
    }

    #[test]
    fn test_validator_error_aborts() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut collector = RouteCollector::new();

        let result = resolver.resolve(&routes(), &mut FailingValidator, &mut collector);
        assert!(result.is_err());
        assert!(collector.routes().is_empty());
    }

    #[test]
    fn test_dyn_validator_and_consumer() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut validator: Box<dyn RouteValidator> = Box::new(AcceptAll);
        let mut collector = RouteCollector::new();
        let consumer: &mut dyn RouteConsumer = &mut collector;

        let stats = resolver
            .resolve(&routes(), validator.as_mut(), consumer)
            .unwrap();
        assert_eq!(stats.converted, 3);
        assert_eq!(collector.routes().len(), 3);
    }

    #[test]
    fn test_writer_output_reads_back() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut sinks = Tee::new(RouteWriter::new(Vec::new()), RouteCollector::new());

        resolver
            .resolve(&routes(), &mut AcceptAll, &mut sinks)
            .unwrap();

        let (writer, collector) = sinks.into_parts();
        assert_eq!(writer.written(), 3);
        let bytes = writer.into_inner().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(
            text.lines().next().unwrap(),
            "[(-26.2, 28.05), (51.5, -0.12), (34.69, 135.5)]"
        );

        let reread = read_coordinate_routes_from(bytes.as_slice()).unwrap();
        assert_eq!(reread, collector.into_routes());
    }

    #[test]
    fn test_empty_input() {
        let (index, geo) = fixtures();
        let resolver = RouteResolver::new(&index, &geo);
        let mut writer = RouteWriter::new(Vec::new());
        let stats = resolver
            .resolve(&Vec::<IpRoute>::new(), &mut AcceptAll, &mut writer)
            .unwrap();
        assert_eq!(stats, ResolveStats::default());
        assert!(writer.into_inner().unwrap().is_empty());
    }
}
