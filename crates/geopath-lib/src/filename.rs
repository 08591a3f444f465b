//! Cloud region metadata carried in route file names
//!
//! Measurement files are named `<prefix>.<cloud>.<region>.<cloud>.<region>.by_<kind>`
//! or, when both ends are in the same cloud, `<prefix>.<cloud>.<region>.<region>.by_<kind>`.

use crate::models::CloudRegionPair;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

static FOUR_TOKEN: OnceLock<Regex> = OnceLock::new();
static THREE_TOKEN: OnceLock<Regex> = OnceLock::new();

fn four_token() -> &'static Regex {
    FOUR_TOKEN.get_or_init(|| {
        Regex::new(r"^.*\.(aws|gcloud|gcp)\.([\w-]+)\.(aws|gcloud|gcp)\.([\w-]+)\.by_.*")
            .expect("valid four-token filename pattern")
    })
}

fn three_token() -> &'static Regex {
    THREE_TOKEN.get_or_init(|| {
        Regex::new(r"^.*\.(aws|gcloud|gcp)\.([\w-]+)\.([\w-]+)\.by_.*")
            .expect("valid three-token filename pattern")
    })
}

/// Extract `(src_cloud, src_region, dst_cloud, dst_region)` from a file name
///
/// The four-token form is tried first. In the three-token form the
/// destination shares the source cloud. Returns `None` when neither form
/// matches; callers without a fallback should treat that as fatal.
pub fn detect_cloud_regions(filename: &str) -> Option<CloudRegionPair> {
    if let Some(caps) = four_token().captures(filename) {
        return Some(CloudRegionPair::new(&caps[1], &caps[2], &caps[3], &caps[4]));
    }
    let caps = three_token().captures(filename)?;
    Some(CloudRegionPair::new(&caps[1], &caps[2], &caps[1], &caps[3]))
}

/// Output name for a converted routes file: basename with `.by_ip` replaced by `.by_geo`
pub fn auto_output_name(routes_file: &Path) -> String {
    let base = routes_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = base.strip_suffix(".by_ip").unwrap_or(&base);
    format!("{stem}.by_geo")
}
