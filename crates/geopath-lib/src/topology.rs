//! Router topology index
//!
//! Loads the ITDK `.nodes` file, where each record looks like
//! `node N1234:  10.0.0.1 10.0.0.2`, into one of two lookup directions.
//! Nodes files can hold tens of millions of records, so the direction is
//! chosen by the caller at load time and only that map is ever built.

use crate::models::NodeId;
use crate::observability::PipelineMetrics;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// Number of nodes between two progress log lines
pub const PROGRESS_INTERVAL: usize = 1_000_000;

const NODE_PREFIX: &str = "node N";

/// A lookup structure that can be filled from topology records
pub trait TopologyIndex: Default {
    /// Record one node and the interface addresses it owns
    fn insert(&mut self, node_id: NodeId, ips: Vec<String>);

    /// Number of entries in the index
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// IP address to node lookup, used when resolving routes
///
/// An address listed under several nodes keeps the last node seen in the
/// file. This mirrors the dataset as-is and is not corrected.
#[derive(Debug, Default)]
pub struct IpToNodeIndex {
    ip_to_node: HashMap<String, NodeId>,
}

impl IpToNodeIndex {
    pub fn node_of(&self, ip: &str) -> Option<&NodeId> {
        self.ip_to_node.get(ip)
    }
}

impl TopologyIndex for IpToNodeIndex {
    fn insert(&mut self, node_id: NodeId, ips: Vec<String>) {
        for ip in ips {
            self.ip_to_node.insert(ip, node_id.clone());
        }
    }

    fn len(&self) -> usize {
        self.ip_to_node.len()
    }
}

impl FromIterator<(String, NodeId)> for IpToNodeIndex {
    fn from_iter<T: IntoIterator<Item = (String, NodeId)>>(iter: T) -> Self {
        Self {
            ip_to_node: iter.into_iter().collect(),
        }
    }
}

/// Node to interface addresses lookup
#[derive(Debug, Default)]
pub struct NodeToIpsIndex {
    node_to_ips: HashMap<NodeId, Vec<String>>,
}

impl NodeToIpsIndex {
    pub fn ips_of(&self, node_id: &str) -> Option<&[String]> {
        self.node_to_ips.get(node_id).map(Vec::as_slice)
    }
}

impl TopologyIndex for NodeToIpsIndex {
    fn insert(&mut self, node_id: NodeId, ips: Vec<String>) {
        self.node_to_ips.insert(node_id, ips);
    }

    fn len(&self) -> usize {
        self.node_to_ips.len()
    }
}

/// Parse one nodes-file record into its node id and addresses
///
/// Returns `None` when the line does not start with `node N` or lacks the
/// `:` separator.
pub fn parse_node_line(line: &str) -> Option<(NodeId, Vec<String>)> {
    if !line.starts_with(NODE_PREFIX) {
        return None;
    }
    let (head, tail) = line.split_once(':')?;
    let node_id = head.split_whitespace().nth(1)?;
    let ips = tail.split_whitespace().map(str::to_string).collect();
    Some((NodeId::new(node_id), ips))
}

/// Load a nodes file from disk into the requested index type
pub fn load_topology<I: TopologyIndex>(path: impl AsRef<Path>) -> Result<I> {
    let path = path.as_ref();
    info!(path = %path.display(), "Loading ITDK nodes");
    let file = File::open(path)
        .with_context(|| format!("Failed to open nodes file {}", path.display()))?;
    read_topology(file)
}

/// Build an index from any nodes-file reader
pub fn read_topology<I: TopologyIndex>(reader: impl Read) -> Result<I> {
    let start = Instant::now();
    let metrics = PipelineMetrics::new();
    let mut index = I::default();
    let mut node_count = 0usize;

    for (line_no, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read nodes line {}", line_no + 1))?;
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }

        let Some((node_id, ips)) = parse_node_line(&line) else {
            error!(line = line_no + 1, content = %line, "Cannot process nodes line");
            continue;
        };
        index.insert(node_id, ips);

        node_count += 1;
        if node_count % PROGRESS_INTERVAL == 0 {
            debug!(
                elapsed_secs = start.elapsed().as_secs_f64(),
                node_count,
                "Loading ITDK nodes"
            );
        }
    }

    metrics.add_topology_nodes(node_count as u64);
    info!(
        elapsed_secs = start.elapsed().as_secs_f64(),
        node_count,
        entries = index.len(),
        "Loaded ITDK nodes"
    );
    Ok(index)
}
