//! geopath CLI
//!
//! Command-line tools for resolving traceroute paths between cloud regions
//! into geographic routes and analysing their distribution.

mod commands;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use commands::{cloud_ranges, combine, convert, distribution, topology};
use geopath_lib::PipelineMetrics;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{LogFormat, Settings};

/// geopath CLI
#[derive(Parser)]
#[command(name = "geopath")]
#[command(author, version, about = "Resolve traceroute paths between cloud regions into geographic routes", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/geopath/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// ITDK nodes file
    #[arg(long, global = true)]
    pub nodes_file: Option<PathBuf>,

    /// ITDK node geolocation file
    #[arg(long, global = true)]
    pub geo_file: Option<PathBuf>,

    /// Write pipeline counters in Prometheus text format to this file
    #[arg(long, global = true)]
    pub metrics_out: Option<PathBuf>,

    /// Output format for lookup commands
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert IP routes into coordinate routes
    Convert(convert::ConvertArgs),

    /// Export the frequency distribution of coordinate routes
    Distribution(distribution::DistributionArgs),

    /// Merge per-region-pair distribution TSVs
    Combine(combine::CombineArgs),

    /// Look up the topology node of an IP or the IPs of a node
    Topology(topology::TopologyArgs),

    /// List the announced IP prefixes of a cloud provider
    CloudRanges(cloud_ranges::CloudRangesArgs),
}

fn init_tracing(format: LogFormat, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)));

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry.with(fmt::layer().with_writer(std::io::stderr)).init(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration; explicit flags win over file and environment
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(nodes_file) = &cli.nodes_file {
        settings.nodes_file = nodes_file.clone();
    }
    if let Some(geo_file) = &cli.geo_file {
        settings.geo_file = geo_file.clone();
    }

    init_tracing(settings.log_format, cli.verbose);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting geopath");

    // Execute command
    match &cli.command {
        Commands::Convert(args) => convert::run(args, &settings)?,
        Commands::Distribution(args) => distribution::run(args)?,
        Commands::Combine(args) => combine::run(args)?,
        Commands::Topology(args) => topology::run(args, &settings, cli.format)?,
        Commands::CloudRanges(args) => cloud_ranges::run(args, &settings, cli.format)?,
    }

    if let Some(path) = &cli.metrics_out {
        let text = PipelineMetrics::new().encode_text()?;
        std::fs::write(path, text)
            .with_context(|| format!("Failed to write metrics to {}", path.display()))?;
        info!(path = %path.display(), "Wrote pipeline metrics");
    }

    Ok(())
}
