//! Export the frequency distribution of coordinate routes

use anyhow::Result;
use clap::Args;
use geopath_lib::literal::read_coordinate_routes;
use geopath_lib::route_metrics::{distribution, write_distribution, MetricEngine, RouteMetric};
use std::path::PathBuf;
use tracing::info;

use crate::output::{open_output, print_success};

#[derive(Debug, Args)]
pub struct DistributionArgs {
    /// Routes file, each line a list of (lat, long) coordinates
    #[arg(long)]
    pub routes_file: PathBuf,

    /// Metrics to add as columns (hop_count, distance_km)
    #[arg(long, num_args = 1..)]
    pub include: Vec<RouteMetric>,

    /// Output TSV file (stdout if not specified)
    #[arg(short, long = "output-tsv")]
    pub output: Option<PathBuf>,
}

pub fn run(args: &DistributionArgs) -> Result<()> {
    let routes = read_coordinate_routes(&args.routes_file)?;
    info!(
        routes = routes.len(),
        metrics = ?args.include,
        "Exporting routes distribution"
    );

    let mut engine = MetricEngine::new();
    let rows = distribution(&routes, &args.include, &mut engine);
    write_distribution(&rows, &args.include, open_output(args.output.as_deref())?)?;

    let cache = engine.distance_cache();
    info!(
        distinct_segments = cache.len(),
        cache_hits = cache.hits(),
        "Done"
    );

    if let Some(output) = &args.output {
        print_success(&format!(
            "Wrote {} distinct routes to {}",
            rows.len(),
            output.display()
        ));
    }
    Ok(())
}
