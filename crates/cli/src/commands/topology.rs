//! Topology lookups

use anyhow::Result;
use clap::Args;
use geopath_lib::topology::{load_topology, IpToNodeIndex, NodeToIpsIndex};
use serde::Serialize;
use tabled::Tabled;

use crate::config::Settings;
use crate::output::{print_table, OutputFormat};

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
pub struct TopologyArgs {
    /// Find the node owning an interface address
    #[arg(long)]
    pub ip: Option<String>,

    /// List the interface addresses of a node (e.g. N1234)
    #[arg(long)]
    pub node: Option<String>,
}

/// Row for the topology lookup table
#[derive(Tabled, Serialize)]
struct MappingRow {
    #[tabled(rename = "Node")]
    node: String,
    #[tabled(rename = "IP")]
    ip: String,
}

pub fn run(args: &TopologyArgs, settings: &Settings, format: OutputFormat) -> Result<()> {
    let rows: Vec<MappingRow> = match (&args.ip, &args.node) {
        (Some(ip), _) => {
            let index: IpToNodeIndex = load_topology(&settings.nodes_file)?;
            index
                .node_of(ip)
                .map(|node| MappingRow {
                    node: node.to_string(),
                    ip: ip.clone(),
                })
                .into_iter()
                .collect()
        }
        (None, Some(node)) => {
            let index: NodeToIpsIndex = load_topology(&settings.nodes_file)?;
            index
                .ips_of(node)
                .unwrap_or_default()
                .iter()
                .map(|ip| MappingRow {
                    node: node.clone(),
                    ip: ip.clone(),
                })
                .collect()
        }
        (None, None) => Vec::new(),
    };

    print_table(&rows, format)
}
