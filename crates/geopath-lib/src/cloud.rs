//! Cloud provider IP ranges
//!
//! Reads the published `ip-ranges` JSON documents of AWS and Google Cloud
//! into a flat list of `(prefix, cloud, region)` entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

/// Supported cloud providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Cloud {
    Aws,
    Gcloud,
}

impl Cloud {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cloud::Aws => "aws",
            Cloud::Gcloud => "gcloud",
        }
    }

    /// File name of the provider's ranges document inside the cloud data directory
    pub fn ranges_file_name(&self) -> &'static str {
        match self {
            Cloud::Aws => "ip-ranges.aws.json",
            Cloud::Gcloud => "ip-ranges.gcloud.json",
        }
    }

    pub fn ranges_path(&self, data_dir: impl AsRef<Path>) -> PathBuf {
        data_dir.as_ref().join(self.ranges_file_name())
    }
}

impl fmt::Display for Cloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cloud {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aws" => Ok(Cloud::Aws),
            "gcloud" | "gcp" => Ok(Cloud::Gcloud),
            other => Err(CloudError::Unsupported(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
pub enum CloudError {
    #[error("Unsupported cloud {0}")]
    Unsupported(String),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed ip ranges document: {0}")]
    Json(#[from] serde_json::Error),
}

/// One announced prefix of a cloud provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloudPrefix {
    pub prefix: String,
    pub cloud: Cloud,
    pub region: String,
}

#[derive(Deserialize)]
struct AwsRanges {
    prefixes: Vec<AwsPrefix>,
}

#[derive(Deserialize)]
struct AwsPrefix {
    ip_prefix: String,
    region: String,
}

#[derive(Deserialize)]
struct GcloudRanges {
    prefixes: Vec<GcloudPrefix>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcloudPrefix {
    /// absent on IPv6-only entries
    ipv4_prefix: Option<String>,
    scope: String,
}

/// Load the prefixes of `cloud` from its ranges document at `path`
///
/// With `region` set only prefixes announced for that region are kept.
pub fn load_cloud_ip_ranges(
    cloud: Cloud,
    path: impl AsRef<Path>,
    region: Option<&str>,
) -> Result<Vec<CloudPrefix>, CloudError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| CloudError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let prefixes = read_cloud_ip_ranges(cloud, BufReader::new(file), region)?;
    info!(
        cloud = %cloud,
        path = %path.display(),
        region = region.unwrap_or("*"),
        prefixes = prefixes.len(),
        "Loaded cloud ip ranges"
    );
    Ok(prefixes)
}

/// Parse a ranges document from any reader
pub fn read_cloud_ip_ranges(
    cloud: Cloud,
    reader: impl Read,
    region: Option<&str>,
) -> Result<Vec<CloudPrefix>, CloudError> {
    let wanted = |r: &str| region.map_or(true, |want| want == r);

    let prefixes = match cloud {
        Cloud::Aws => {
            let doc: AwsRanges = serde_json::from_reader(reader)?;
            doc.prefixes
                .into_iter()
                .filter(|p| wanted(&p.region))
                .map(|p| CloudPrefix {
                    prefix: p.ip_prefix,
                    cloud,
                    region: p.region,
                })
                .collect()
        }
        Cloud::Gcloud => {
            let doc: GcloudRanges = serde_json::from_reader(reader)?;
            doc.prefixes
                .into_iter()
                .filter(|p| wanted(&p.scope))
                .filter_map(|p| {
                    Some(CloudPrefix {
                        prefix: p.ipv4_prefix?,
                        cloud,
                        region: p.scope,
                    })
                })
                .collect()
        }
    };
    Ok(prefixes)
}
