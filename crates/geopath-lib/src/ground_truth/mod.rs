//! Ground-truth cloud region locations
//!
//! This module provides:
//! - The `(cloud, region) -> coordinate` table loaded from CSV
//! - Coordinate to ISO region resolution with an explicit memo cache
//! - Route validators comparing route endpoints with ground truth

mod region_lookup;
mod validator;

#[cfg(test)]
mod tests;

pub use region_lookup::{CarbonApiClient, LookupError, RegionCache, RegionLookup};
pub use validator::{make_validator, AcceptAll, GroundTruthValidator, RouteValidator};

use crate::models::{Coordinate, RegionKey};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Columns the ground-truth CSV must provide
pub const REQUIRED_COLUMNS: [&str; 4] = ["cloud", "region", "latitude", "longitude"];

/// Fatal ground-truth input errors
#[derive(Debug, Error)]
pub enum GroundTruthError {
    #[error("failed to open ground truth CSV {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("required column '{0}' is missing in ground truth CSV")]
    MissingColumn(String),
    #[error("malformed ground truth CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("coordinate {coordinate} of {key} is out of range")]
    InvalidCoordinate { key: RegionKey, coordinate: Coordinate },
    #[error("region not found in ground truth CSV: {0}")]
    RegionNotFound(RegionKey),
    #[error("region lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

#[derive(Debug, Deserialize)]
struct GroundTruthRow {
    cloud: String,
    region: String,
    latitude: f64,
    longitude: f64,
}

/// Canonical location of each cloud region, immutable once loaded
#[derive(Debug, Default, Clone)]
pub struct GroundTruth {
    regions: HashMap<RegionKey, Coordinate>,
}

impl GroundTruth {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GroundTruthError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| GroundTruthError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), regions = table.len(), "Loaded ground truth regions");
        Ok(table)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, GroundTruthError> {
        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(GroundTruthError::MissingColumn(column.to_string()));
            }
        }

        let mut regions = HashMap::new();
        for row in csv_reader.deserialize::<GroundTruthRow>() {
            let row = row?;
            let key = RegionKey::new(row.cloud, row.region);
            let coordinate = Coordinate::new(row.latitude, row.longitude);
            if !coordinate.is_valid() {
                return Err(GroundTruthError::InvalidCoordinate { key, coordinate });
            }
            regions.insert(key, coordinate);
        }
        Ok(Self { regions })
    }

    /// Coordinate of a cloud region, `RegionNotFound` if the table lacks it
    pub fn coordinate(&self, cloud: &str, region: &str) -> Result<Coordinate, GroundTruthError> {
        let key = RegionKey::new(cloud, region);
        self.regions
            .get(&key)
            .copied()
            .ok_or(GroundTruthError::RegionNotFound(key))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromIterator<(RegionKey, Coordinate)> for GroundTruth {
    fn from_iter<T: IntoIterator<Item = (RegionKey, Coordinate)>>(iter: T) -> Self {
        Self {
            regions: iter.into_iter().collect(),
        }
    }
}
