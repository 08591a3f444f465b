//! Merge per-region-pair distribution TSVs

use anyhow::Result;
use clap::Args;
use geopath_lib::combine::combine_tsvs;
use std::path::PathBuf;

use crate::output::{open_output, print_success};

#[derive(Debug, Args)]
pub struct CombineArgs {
    /// Distribution TSVs named *.src_cloud.src_region.dst_cloud.dst_region.*
    #[arg(short = 'i', long = "input-tsvs", required = true, num_args = 1..)]
    pub inputs: Vec<PathBuf>,

    /// Output TSV file (stdout if not specified)
    #[arg(short = 'o', long = "output-tsv")]
    pub output: Option<PathBuf>,
}

pub fn run(args: &CombineArgs) -> Result<()> {
    let rows = combine_tsvs(&args.inputs, open_output(args.output.as_deref())?)?;
    if let Some(output) = &args.output {
        print_success(&format!(
            "Combined {} rows from {} files into {}",
            rows,
            args.inputs.len(),
            output.display()
        ));
    }
    Ok(())
}
