//! Tests for ground-truth loading, region caching and route validation

use super::*;
use crate::models::{CoordRoute, Coordinate, RegionKey};
use std::cell::Cell;
use std::io::Write;
use tempfile::NamedTempFile;

const GROUND_TRUTH_CSV: &str = "cloud,region,latitude,longitude\n\
aws,af-south-1,-33.92,18.42\n\
aws,ap-northeast-1,35.68,139.69\n\
gcloud,us-east1,33.19,-80.01\n";

const CAPE_TOWN: Coordinate = Coordinate { lat: -33.92, lon: 18.42 };
const TOKYO: Coordinate = Coordinate { lat: 35.68, lon: 139.69 };
const JOHANNESBURG: Coordinate = Coordinate { lat: -26.2, lon: 28.05 };
const OSAKA: Coordinate = Coordinate { lat: 34.69, lon: 135.5 };
const LONDON: Coordinate = Coordinate { lat: 51.5, lon: -0.12 };

/// Fixed mapping standing in for the region service
fn iso_of(coordinate: Coordinate) -> Result<String, LookupError> {
    let iso = if coordinate.lon > 100.0 {
        "JP"
    } else if coordinate.lat < 0.0 {
        "ZA"
    } else if coordinate.lon < -50.0 {
        "US-SC"
    } else {
        "GB"
    };
    Ok(iso.to_string())
}

fn ground_truth() -> GroundTruth {
    GroundTruth::from_reader(GROUND_TRUTH_CSV.as_bytes()).unwrap()
}

mod loading_tests {
    use super::*;

    #[test]
    fn test_load_ground_truth() {
        let table = ground_truth();
        assert_eq!(table.len(), 3);
        assert_eq!(table.coordinate("aws", "af-south-1").unwrap(), CAPE_TOWN);
        assert_eq!(
            table.coordinate("gcloud", "us-east1").unwrap(),
            Coordinate::new(33.19, -80.01)
        );
    }

    #[test]
    fn test_load_ground_truth_from_file_with_extra_columns() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "cloud,region,city,latitude,longitude\naws,eu-west-1,Dublin,53.35,-6.26\n"
        )
        .unwrap();

        let table = GroundTruth::load(file.path()).unwrap();
        assert_eq!(
            table.coordinate("aws", "eu-west-1").unwrap(),
            Coordinate::new(53.35, -6.26)
        );
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let csv = "cloud,region,latitude\naws,us-east-1,38.9\n";
        let err = GroundTruth::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GroundTruthError::MissingColumn(ref c) if c == "longitude"));
    }

    #[test]
    fn test_malformed_value_is_fatal() {
        let csv = "cloud,region,latitude,longitude\naws,us-east-1,north,-77.0\n";
        let err = GroundTruth::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, GroundTruthError::Csv(_)));
    }

    #[test]
    fn test_out_of_range_coordinate_is_fatal() {
        let csv = "cloud,region,latitude,longitude\naws,us-east-1,-77.0,38.9\naws,eu-west-1,53.35,186.26\n";
        let err = GroundTruth::from_reader(csv.as_bytes()).unwrap_err();
        match err {
            GroundTruthError::InvalidCoordinate { key, coordinate } => {
                assert_eq!(key, RegionKey::new("aws", "eu-west-1"));
                assert_eq!(coordinate, Coordinate::new(53.35, 186.26));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_unknown_region() {
        let err = ground_truth().coordinate("aws", "mars-1").unwrap_err();
        match err {
            GroundTruthError::RegionNotFound(key) => {
                assert_eq!(key, RegionKey::new("aws", "mars-1"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = GroundTruth::load("/nonexistent/ground_truth.csv").unwrap_err();
        assert!(matches!(err, GroundTruthError::Open { .. }));
    }
}

mod cache_tests {
    use super::*;

    #[test]
    fn test_region_cache_calls_lookup_once_per_coordinate() {
        let calls = Cell::new(0);
        let lookup = |c: Coordinate| {
            calls.set(calls.get() + 1);
            iso_of(c)
        };
        let mut cache = RegionCache::new(lookup);

        assert_eq!(cache.region_of(TOKYO).unwrap(), "JP");
        assert_eq!(cache.region_of(TOKYO).unwrap(), "JP");
        assert_eq!(cache.region_of(CAPE_TOWN).unwrap(), "ZA");

        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 2);
        assert_eq!(cache.len(), 2);
        drop(cache);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_region_cache_does_not_store_failures() {
        let lookup = |c: Coordinate| -> Result<String, LookupError> { Err(LookupError::NoRegion(c)) };
        let mut cache = RegionCache::new(lookup);

        assert!(cache.region_of(LONDON).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_region_cache_clear() {
        let mut cache = RegionCache::new(iso_of);
        cache.region_of(LONDON).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}

mod validator_tests {
    use super::*;

    #[test]
    fn test_accept_all() {
        let mut validator = AcceptAll;
        assert!(validator.check(&CoordRoute::default()).unwrap());
    }

    #[test]
    fn test_make_validator_resolves_endpoint_isos() {
        let table = ground_truth();
        let mut regions = RegionCache::new(iso_of);
        let validator =
            make_validator(&table, "aws", "af-south-1", "aws", "ap-northeast-1", &mut regions)
                .unwrap();

        assert_eq!(validator.src_iso(), "ZA");
        assert_eq!(validator.dst_iso(), "JP");
        assert_eq!(validator.src(), &RegionKey::new("aws", "af-south-1"));
        assert_eq!(validator.dst(), &RegionKey::new("aws", "ap-northeast-1"));
    }

    #[test]
    fn test_validator_accepts_matching_endpoints_only() {
        let table = ground_truth();
        let mut regions = RegionCache::new(iso_of);
        let mut validator =
            make_validator(&table, "aws", "af-south-1", "aws", "ap-northeast-1", &mut regions)
                .unwrap();

        // X -> Y
        let good = CoordRoute::new(vec![JOHANNESBURG, LONDON, OSAKA]);
        assert!(validator.check(&good).unwrap());

        // Y -> X, X -> X, other -> Y, X -> other
        for route in [
            vec![OSAKA, JOHANNESBURG],
            vec![JOHANNESBURG, CAPE_TOWN],
            vec![LONDON, OSAKA],
            vec![JOHANNESBURG, LONDON],
        ] {
            assert!(!validator.check(&CoordRoute::new(route)).unwrap());
        }
    }

    #[test]
    fn test_validator_rejects_empty_route() {
        let table = ground_truth();
        let mut regions = RegionCache::new(iso_of);
        let mut validator =
            make_validator(&table, "aws", "af-south-1", "aws", "ap-northeast-1", &mut regions)
                .unwrap();
        assert!(!validator.check(&CoordRoute::default()).unwrap());
    }

    #[test]
    fn test_make_validator_unknown_region_is_fatal() {
        let table = ground_truth();
        let mut regions = RegionCache::new(iso_of);
        let result = make_validator(&table, "aws", "af-south-1", "aws", "moon-1", &mut regions);
        assert!(matches!(result, Err(GroundTruthError::RegionNotFound(_))));
    }

    #[test]
    fn test_validators_share_region_cache() {
        let table = ground_truth();
        let mut regions = RegionCache::new(iso_of);
        {
            let mut validator =
                make_validator(&table, "aws", "af-south-1", "aws", "ap-northeast-1", &mut regions)
                    .unwrap();
            validator
                .check(&CoordRoute::new(vec![JOHANNESBURG, OSAKA]))
                .unwrap();
        }
        let before = regions.misses();
        make_validator(&table, "aws", "af-south-1", "aws", "ap-northeast-1", &mut regions)
            .unwrap();
        assert_eq!(regions.misses(), before);
    }
}

mod http_client_tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_carbon_api_client_endpoint() {
        let client = CarbonApiClient::new("http://localhost:8000/api").unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "http://localhost:8000/api/regions/coordinate"
        );
    }

    #[test]
    fn test_carbon_api_client_lookup() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/regions/coordinate")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("latitude".into(), "35.68".into()),
                Matcher::UrlEncoded("longitude".into(), "139.69".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"iso": "JP-TK"}"#)
            .create();

        let client = CarbonApiClient::new(&server.url()).unwrap();
        assert_eq!(client.region_of(TOKYO).unwrap(), "JP-TK");
        mock.assert();
    }

    #[test]
    fn test_carbon_api_client_accepts_region_alias() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/regions/coordinate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"region": "ZA"}"#)
            .create();

        let client = CarbonApiClient::new(&server.url()).unwrap();
        assert_eq!(client.region_of(CAPE_TOWN).unwrap(), "ZA");
    }

    #[test]
    fn test_carbon_api_client_error_status() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/regions/coordinate")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("overloaded")
            .create();

        let client = CarbonApiClient::new(&server.url()).unwrap();
        match client.region_of(LONDON) {
            Err(LookupError::Api { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_carbon_api_client_missing_region() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("GET", "/regions/coordinate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"iso": null}"#)
            .create();

        let client = CarbonApiClient::new(&server.url()).unwrap();
        assert!(matches!(
            client.region_of(LONDON),
            Err(LookupError::NoRegion(_))
        ));
    }
}
