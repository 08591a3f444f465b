//! Cloud provider IP ranges listing

use anyhow::Result;
use clap::Args;
use geopath_lib::cloud::{load_cloud_ip_ranges, Cloud};
use serde::Serialize;
use tabled::Tabled;

use crate::config::Settings;
use crate::output::{print_table, OutputFormat};

#[derive(Debug, Args)]
pub struct CloudRangesArgs {
    /// Cloud provider (aws, gcloud)
    #[arg(long)]
    pub cloud: Cloud,

    /// Only list prefixes of this region
    #[arg(long)]
    pub region: Option<String>,
}

/// Row for the prefixes table
#[derive(Tabled, Serialize)]
struct PrefixRow {
    #[tabled(rename = "Prefix")]
    prefix: String,
    #[tabled(rename = "Cloud")]
    cloud: String,
    #[tabled(rename = "Region")]
    region: String,
}

pub fn run(args: &CloudRangesArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let path = args.cloud.ranges_path(&settings.cloud_data_dir);
    let prefixes = load_cloud_ip_ranges(args.cloud, path, args.region.as_deref())?;

    let rows: Vec<PrefixRow> = prefixes
        .into_iter()
        .map(|p| PrefixRow {
            prefix: p.prefix,
            cloud: p.cloud.to_string(),
            region: p.region,
        })
        .collect();

    print_table(&rows, format)
}
