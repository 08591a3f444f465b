//! Convert IP routes into coordinate routes

use anyhow::{bail, Context, Result};
use clap::Args;
use geopath_lib::filename::{auto_output_name, detect_cloud_regions};
use geopath_lib::ground_truth::{make_validator, AcceptAll, CarbonApiClient, GroundTruth, RegionCache};
use geopath_lib::literal::read_ip_routes;
use geopath_lib::models::CloudRegionPair;
use geopath_lib::resolver::{ResolveStats, RouteResolver, RouteWriter};
use geopath_lib::topology::{load_topology, IpToNodeIndex};
use geopath_lib::GeoTable;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Settings;
use crate::output::{color_ratio, open_output, print_success, print_warning};

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Routes files, each line a list of hop IP addresses
    #[arg(long = "routes-files", required = true, num_args = 1..)]
    pub routes_files: Vec<PathBuf>,

    /// Output files, one per routes file; names are derived from the
    /// routes files when the flag is given without values
    #[arg(short = 'o', long = "outputs", num_args = 0..)]
    pub outputs: Option<Vec<PathBuf>>,

    /// Keep only routes whose endpoints lie in the source and destination
    /// regions' ISO zones
    #[arg(long, requires = "ground_truth_csv")]
    pub filter_by_ground_truth: bool,

    /// CSV with cloud,region,latitude,longitude columns
    #[arg(long)]
    pub ground_truth_csv: Option<PathBuf>,

    /// Source cloud (detected from the file name when omitted)
    #[arg(long)]
    pub src_cloud: Option<String>,

    /// Source region
    #[arg(long)]
    pub src_region: Option<String>,

    /// Destination cloud
    #[arg(long)]
    pub dst_cloud: Option<String>,

    /// Destination region
    #[arg(long)]
    pub dst_region: Option<String>,
}

impl ConvertArgs {
    /// Region pair given on the command line; all four flags or none
    pub fn explicit_regions(&self) -> Result<Option<CloudRegionPair>> {
        match (&self.src_cloud, &self.src_region, &self.dst_cloud, &self.dst_region) {
            (None, None, None, None) => Ok(None),
            (Some(src_cloud), Some(src_region), Some(dst_cloud), Some(dst_region)) => Ok(Some(
                CloudRegionPair::new(src_cloud, src_region, dst_cloud, dst_region),
            )),
            _ => bail!(
                "--src-cloud, --src-region, --dst-cloud and --dst-region must be given together"
            ),
        }
    }

    /// Output path for each routes file, `None` meaning stdout
    pub fn output_paths(&self) -> Result<Vec<Option<PathBuf>>> {
        match &self.outputs {
            None => Ok(vec![None; self.routes_files.len()]),
            Some(outputs) if outputs.is_empty() => Ok(self
                .routes_files
                .iter()
                .map(|file| Some(PathBuf::from(auto_output_name(file))))
                .collect()),
            Some(outputs) if outputs.len() == self.routes_files.len() => {
                Ok(outputs.iter().cloned().map(Some).collect())
            }
            Some(outputs) => bail!(
                "Got {} output files for {} routes files",
                outputs.len(),
                self.routes_files.len()
            ),
        }
    }
}

struct GroundTruthFilter {
    table: GroundTruth,
    regions: RegionCache<CarbonApiClient>,
    explicit: Option<CloudRegionPair>,
}

impl GroundTruthFilter {
    fn regions_for(&self, routes_file: &Path) -> Result<CloudRegionPair> {
        if let Some(pair) = &self.explicit {
            return Ok(pair.clone());
        }
        let name = routes_file
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        detect_cloud_regions(name).with_context(|| {
            format!("Cannot detect cloud regions from filename '{}'", routes_file.display())
        })
    }
}

/// Run the conversion for every routes file
pub fn run(args: &ConvertArgs, settings: &Settings) -> Result<()> {
    let outputs = args.output_paths()?;
    let explicit = args.explicit_regions()?;

    let mut filter = if args.filter_by_ground_truth {
        let csv = args
            .ground_truth_csv
            .as_deref()
            .context("--filter-by-ground-truth requires --ground-truth-csv")?;
        let table = GroundTruth::load(csv)?;
        let client =
            CarbonApiClient::with_timeout(&settings.region_api_url, settings.region_api_timeout())?;
        Some(GroundTruthFilter {
            table,
            regions: RegionCache::new(client),
            explicit,
        })
    } else {
        if explicit.is_some() {
            print_warning("Region flags are ignored without --filter-by-ground-truth");
        }
        None
    };

    let index: IpToNodeIndex = load_topology(&settings.nodes_file)?;
    let geo = GeoTable::load(&settings.geo_file)?;
    let resolver = RouteResolver::new(&index, &geo);

    for (routes_file, output) in args.routes_files.iter().zip(outputs) {
        info!(routes_file = %routes_file.display(), "Converting routes");
        let routes = read_ip_routes(routes_file)?;
        let mut writer = RouteWriter::new(open_output(output.as_deref())?);

        let stats: ResolveStats = match filter.as_mut() {
            Some(filter) => {
                let pair = filter.regions_for(routes_file)?;
                let mut validator = make_validator(
                    &filter.table,
                    &pair.src_cloud,
                    &pair.src_region,
                    &pair.dst_cloud,
                    &pair.dst_region,
                    &mut filter.regions,
                )?;
                resolver.resolve(&routes, &mut validator, &mut writer)?
            }
            None => resolver.resolve(&routes, &mut AcceptAll, &mut writer)?,
        };

        if let Some(output) = &output {
            print_success(&format!(
                "Converted {} routes from {} into {}",
                color_ratio(stats.converted, stats.total),
                routes_file.display(),
                output.display()
            ));
        }
    }

    if let Some(filter) = &filter {
        info!(
            lookups = filter.regions.misses(),
            cache_hits = filter.regions.hits(),
            "Region lookups"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(files: &[&str], outputs: Option<&[&str]>) -> ConvertArgs {
        ConvertArgs {
            routes_files: files.iter().map(PathBuf::from).collect(),
            outputs: outputs.map(|o| o.iter().map(PathBuf::from).collect()),
            filter_by_ground_truth: false,
            ground_truth_csv: None,
            src_cloud: None,
            src_region: None,
            dst_cloud: None,
            dst_region: None,
        }
    }

    #[test]
    fn test_outputs_default_to_stdout() {
        let paths = args(&["a.by_ip", "b.by_ip"], None).output_paths().unwrap();
        assert_eq!(paths, vec![None, None]);
    }

    #[test]
    fn test_outputs_auto_named() {
        let paths = args(&["data/x.aws.us-east-1.aws.eu-west-1.by_ip"], Some(&[]))
            .output_paths()
            .unwrap();
        assert_eq!(
            paths,
            vec![Some(PathBuf::from("x.aws.us-east-1.aws.eu-west-1.by_geo"))]
        );
    }

    #[test]
    fn test_outputs_count_must_match() {
        assert!(args(&["a", "b"], Some(&["out"])).output_paths().is_err());
        let paths = args(&["a", "b"], Some(&["x", "y"])).output_paths().unwrap();
        assert_eq!(paths, vec![Some(PathBuf::from("x")), Some(PathBuf::from("y"))]);
    }

    #[test]
    fn test_explicit_regions_all_or_none() {
        let mut a = args(&["a"], None);
        assert!(a.explicit_regions().unwrap().is_none());

        a.src_cloud = Some("aws".into());
        assert!(a.explicit_regions().is_err());

        a.src_region = Some("us-east-1".into());
        a.dst_cloud = Some("gcloud".into());
        a.dst_region = Some("europe-west1".into());
        assert_eq!(
            a.explicit_regions().unwrap(),
            Some(CloudRegionPair::new("aws", "us-east-1", "gcloud", "europe-west1"))
        );
    }
}
