//! Route validation against ground-truth endpoints

use super::{GroundTruth, GroundTruthError, LookupError, RegionCache, RegionLookup};
use crate::models::{CoordRoute, Coordinate, RegionKey};
use tracing::info;

/// Decides whether a resolved route is kept
pub trait RouteValidator {
    fn check(&mut self, route: &CoordRoute) -> Result<bool, LookupError>;
}

/// Constant-true validator used when ground-truth filtering is disabled
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl RouteValidator for AcceptAll {
    fn check(&mut self, _route: &CoordRoute) -> Result<bool, LookupError> {
        Ok(true)
    }
}

/// Accepts a route whose first hop lies in the source region's ISO zone and
/// whose last hop lies in the destination region's ISO zone
pub struct GroundTruthValidator<'a, L> {
    src: RegionKey,
    dst: RegionKey,
    src_iso: String,
    dst_iso: String,
    regions: &'a mut RegionCache<L>,
}

impl<L> GroundTruthValidator<'_, L> {
    pub fn src(&self) -> &RegionKey {
        &self.src
    }

    pub fn dst(&self) -> &RegionKey {
        &self.dst
    }

    pub fn src_iso(&self) -> &str {
        &self.src_iso
    }

    pub fn dst_iso(&self) -> &str {
        &self.dst_iso
    }
}

fn hop_in_region<L: RegionLookup>(
    regions: &mut RegionCache<L>,
    hop: Option<&Coordinate>,
    iso: &str,
) -> Result<bool, LookupError> {
    match hop {
        Some(hop) => Ok(regions.region_of(*hop)? == iso),
        None => Ok(false),
    }
}

impl<L: RegionLookup> RouteValidator for GroundTruthValidator<'_, L> {
    fn check(&mut self, route: &CoordRoute) -> Result<bool, LookupError> {
        Ok(hop_in_region(self.regions, route.first(), &self.src_iso)?
            && hop_in_region(self.regions, route.last(), &self.dst_iso)?)
    }
}

/// Build the ground-truth validator for one source/destination region pair
///
/// Both regions must exist in the table; a missing one is a fatal
/// `RegionNotFound`. The endpoint ISO codes are resolved through `regions`,
/// which stays warm for later validators sharing the same cache.
pub fn make_validator<'a, L: RegionLookup>(
    ground_truth: &GroundTruth,
    src_cloud: &str,
    src_region: &str,
    dst_cloud: &str,
    dst_region: &str,
    regions: &'a mut RegionCache<L>,
) -> Result<GroundTruthValidator<'a, L>, GroundTruthError> {
    let src_coordinate = ground_truth.coordinate(src_cloud, src_region)?;
    let dst_coordinate = ground_truth.coordinate(dst_cloud, dst_region)?;
    let src_iso = regions.region_of(src_coordinate)?;
    let dst_iso = regions.region_of(dst_coordinate)?;

    let src = RegionKey::new(src_cloud, src_region);
    let dst = RegionKey::new(dst_cloud, dst_region);
    info!(
        src = %src,
        src_iso = %src_iso,
        dst = %dst,
        dst_iso = %dst_iso,
        "Filtering routes by ground truth endpoints"
    );

    Ok(GroundTruthValidator {
        src,
        dst,
        src_iso,
        dst_iso,
        regions,
    })
}
