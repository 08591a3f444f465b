//! Coordinate to ISO region resolution
//!
//! The region service maps a coordinate to the ISO-style code of the grid
//! region containing it. Calls are slow and the same coordinates recur
//! across many routes, so lookups go through a [`RegionCache`].

use crate::models::Coordinate;
use crate::observability::{caches, PipelineMetrics};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Path of the coordinate lookup endpoint, relative to the service base URL
const REGION_PATH: &str = "regions/coordinate";

/// Default request timeout for the region service
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Region lookup failures; never retried
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("region service request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("region service error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("invalid region service URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("no region known for coordinate {0}")]
    NoRegion(Coordinate),
}

/// External function mapping a coordinate to its ISO region code
pub trait RegionLookup {
    fn region_of(&self, coordinate: Coordinate) -> Result<String, LookupError>;
}

impl<F> RegionLookup for F
where
    F: Fn(Coordinate) -> Result<String, LookupError>,
{
    fn region_of(&self, coordinate: Coordinate) -> Result<String, LookupError> {
        self(coordinate)
    }
}

#[derive(Debug, Deserialize)]
struct RegionResponse {
    #[serde(alias = "region")]
    iso: Option<String>,
}

/// Blocking HTTP client for the carbon-intensity region service
pub struct CarbonApiClient {
    client: Client,
    endpoint: Url,
}

impl CarbonApiClient {
    pub fn new(base_url: &str) -> Result<Self, LookupError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;

        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base.join(REGION_PATH)?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl RegionLookup for CarbonApiClient {
    fn region_of(&self, coordinate: Coordinate) -> Result<String, LookupError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("latitude", coordinate.lat), ("longitude", coordinate.lon)])
            .send()?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(LookupError::Api { status, body });
        }

        let body: RegionResponse = response.json()?;
        body.iso
            .filter(|iso| !iso.is_empty())
            .ok_or(LookupError::NoRegion(coordinate))
    }
}

/// Unbounded, process-lifetime memo of region lookups keyed by coordinate
///
/// Failed lookups are not cached.
pub struct RegionCache<L> {
    lookup: L,
    regions: HashMap<Coordinate, String>,
    hits: u64,
    misses: u64,
    metrics: PipelineMetrics,
}

impl<L: RegionLookup> RegionCache<L> {
    pub fn new(lookup: L) -> Self {
        Self {
            lookup,
            regions: HashMap::new(),
            hits: 0,
            misses: 0,
            metrics: PipelineMetrics::new(),
        }
    }

    /// Region code of a coordinate, calling the lookup only on a miss
    pub fn region_of(&mut self, coordinate: Coordinate) -> Result<String, LookupError> {
        if let Some(region) = self.regions.get(&coordinate) {
            self.hits += 1;
            self.metrics.inc_cache_hit(caches::REGION);
            return Ok(region.clone());
        }

        self.misses += 1;
        self.metrics.inc_cache_miss(caches::REGION);
        let region = self.lookup.region_of(coordinate)?;
        debug!(coordinate = %coordinate, iso = %region, "ISO mapping");
        self.regions.insert(coordinate, region.clone());
        Ok(region)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn clear(&mut self) {
        self.regions.clear();
    }
}
