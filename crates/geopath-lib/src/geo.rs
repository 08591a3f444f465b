//! Node geolocation table
//!
//! Parses the ITDK `.nodes.geo` file: tab separated, `#` comments, no header,
//! columns `node_id continent country region city lat long pop IX source`.
//! The first column is decorated as `node.geo N1234:` and is normalised to
//! the bare node id.

use crate::models::{Coordinate, NodeId};
use crate::observability::PipelineMetrics;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const NODE_ID_PREFIX: &str = "node.geo ";
const NODE_ID_SUFFIX: &str = ":";

/// Columns up to and including `long`; `pop`, `IX` and `source` are ignored
const USED_COLUMNS: usize = 7;

/// Geographic metadata for one topology node
#[derive(Debug, Clone, PartialEq)]
pub struct GeoRecord {
    pub continent: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub lat: Option<f64>,
    pub long: Option<f64>,
}

impl GeoRecord {
    /// Coordinate of the node, if both components are known
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.lat, self.long) {
            (Some(lat), Some(long)) => Some(Coordinate::new(lat, long)),
            _ => None,
        }
    }
}

/// Why a node could not be placed on the map
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoLookupError {
    #[error("node {0} not found in geo table")]
    NotFound(String),
    #[error("node {0} has no coordinates in geo table")]
    MissingCoordinates(String),
}

/// Node id keyed geolocation table, read-only once loaded
#[derive(Debug, Default)]
pub struct GeoTable {
    records: HashMap<NodeId, GeoRecord>,
}

/// Strip the `node.geo ` prefix and `:` suffix from the id column
pub fn normalize_node_id(raw: &str) -> &str {
    let raw = raw.trim();
    let raw = raw.strip_prefix(NODE_ID_PREFIX).unwrap_or(raw);
    raw.strip_suffix(NODE_ID_SUFFIX).unwrap_or(raw).trim()
}

fn parse_optional_float(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl GeoTable {
    /// Load a geo file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading node geo entries");
        let file = File::open(path)
            .with_context(|| format!("Failed to open geo file {}", path.display()))?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), entries = table.len(), "Loaded node geo entries");
        Ok(table)
    }

    /// Build the table from any reader of geo records
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .comment(Some(b'#'))
            .flexible(true)
            .quoting(false)
            .from_reader(reader);

        let mut records = HashMap::new();
        for (row_no, row) in csv_reader.records().enumerate() {
            let row = row.with_context(|| format!("Failed to read geo row {}", row_no + 1))?;
            if row.len() < USED_COLUMNS {
                warn!(row = row_no + 1, columns = row.len(), "Skipping short geo row");
                continue;
            }

            let node_id = normalize_node_id(&row[0]);
            if node_id.is_empty() {
                warn!(row = row_no + 1, raw = &row[0], "Skipping geo row without node id");
                continue;
            }

            let mut record = GeoRecord {
                continent: row[1].to_string(),
                country: row[2].to_string(),
                region: row[3].to_string(),
                city: row[4].to_string(),
                lat: parse_optional_float(&row[5]),
                long: parse_optional_float(&row[6]),
            };
            if record.coordinate().is_some_and(|c| !c.is_valid()) {
                warn!(
                    row = row_no + 1,
                    node = node_id,
                    lat = &row[5],
                    long = &row[6],
                    "Dropping out-of-range coordinates"
                );
                record.lat = None;
                record.long = None;
            }
            records.insert(NodeId::new(node_id), record);
        }

        PipelineMetrics::new().add_geo_records(records.len() as u64);
        Ok(Self { records })
    }

    pub fn get(&self, node_id: &str) -> Option<&GeoRecord> {
        self.records.get(node_id)
    }

    /// Coordinate of a node
    ///
    /// A node absent from the table and a node listed without coordinates
    /// are reported as different errors.
    pub fn coordinate(&self, node_id: &str) -> Result<Coordinate, GeoLookupError> {
        let record = self
            .get(node_id)
            .ok_or_else(|| GeoLookupError::NotFound(node_id.to_string()))?;
        record
            .coordinate()
            .ok_or_else(|| GeoLookupError::MissingCoordinates(node_id.to_string()))
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.records.contains_key(node_id)
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.records.keys()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<(NodeId, GeoRecord)> for GeoTable {
    fn from_iter<T: IntoIterator<Item = (NodeId, GeoRecord)>>(iter: T) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}
