//! Core data models shared by the resolution pipeline

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Route as observed by traceroute: hop IP addresses from source to destination
pub type IpRoute = Vec<String>;

/// Anonymized router identifier from the topology dataset (e.g. `N1234`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Geographic point in degrees
///
/// Equality and hashing use the bit pattern of both components so the
/// coordinate can key the distance and region caches. `-0.0` is folded
/// into `0.0` so the two compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when latitude is within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }

    fn key(&self) -> (u64, u64) {
        (normalized_bits(self.lat), normalized_bits(self.lon))
    }
}

fn normalized_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Coordinate {}

impl Hash for Coordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Coordinate {
    /// Renders `(lat, lon)`, the token used in route files and canonical strings
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", float_token(self.lat), float_token(self.lon))
    }
}

/// Shortest round-trip form with a signed, two-digit exponent (`5e-05`,
/// `1e+16`), matching the route files produced by the measurement tooling
fn float_token(value: f64) -> String {
    let repr = format!("{value:?}");
    match repr.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => repr,
    }
}

/// Route after resolution to coordinates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CoordRoute(pub Vec<Coordinate>);

impl CoordRoute {
    pub fn new(hops: Vec<Coordinate>) -> Self {
        Self(hops)
    }

    pub fn hops(&self) -> &[Coordinate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Coordinate> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Coordinate> {
        self.0.last()
    }

    /// Pipe-joined form used to group identical routes: `(a, b)|(c, d)`
    pub fn canonical(&self) -> String {
        self.0
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl From<Vec<Coordinate>> for CoordRoute {
    fn from(hops: Vec<Coordinate>) -> Self {
        Self(hops)
    }
}

/// Key of a ground-truth entry: a provider's named region
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey {
    pub cloud: String,
    pub region: String,
}

impl RegionKey {
    pub fn new(cloud: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            cloud: cloud.into(),
            region: region.into(),
        }
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.cloud, self.region)
    }
}

/// Source and destination regions of a measured route set
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CloudRegionPair {
    pub src_cloud: String,
    pub src_region: String,
    pub dst_cloud: String,
    pub dst_region: String,
}

impl CloudRegionPair {
    pub fn new(
        src_cloud: impl Into<String>,
        src_region: impl Into<String>,
        dst_cloud: impl Into<String>,
        dst_region: impl Into<String>,
    ) -> Self {
        Self {
            src_cloud: src_cloud.into(),
            src_region: src_region.into(),
            dst_cloud: dst_cloud.into(),
            dst_region: dst_region.into(),
        }
    }

    pub fn src(&self) -> RegionKey {
        RegionKey::new(&self.src_cloud, &self.src_region)
    }

    pub fn dst(&self) -> RegionKey {
        RegionKey::new(&self.dst_cloud, &self.dst_region)
    }
}
