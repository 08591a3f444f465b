//! Configuration management for the CLI
//!
//! Settings are layered from built-in defaults, an optional TOML file and
//! `GEOPATH_*` environment variables. Command-line flags override all of
//! them at the call site.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// CLI configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// ITDK nodes file
    #[serde(default = "default_nodes_file")]
    pub nodes_file: PathBuf,

    /// ITDK node geolocation file
    #[serde(default = "default_geo_file")]
    pub geo_file: PathBuf,

    /// Directory holding the provider `ip-ranges.*.json` documents
    #[serde(default = "default_cloud_data_dir")]
    pub cloud_data_dir: PathBuf,

    /// Base URL of the coordinate to region service
    #[serde(default = "default_region_api_url")]
    pub region_api_url: String,

    /// Request timeout for region lookups in seconds
    #[serde(default = "default_region_api_timeout")]
    pub region_api_timeout_secs: u64,

    #[serde(default)]
    pub log_format: LogFormat,
}

fn default_nodes_file() -> PathBuf {
    PathBuf::from("../data/caida-itdk/midar-iff.nodes")
}

fn default_geo_file() -> PathBuf {
    PathBuf::from("../data/caida-itdk/midar-iff.nodes.geo")
}

fn default_cloud_data_dir() -> PathBuf {
    PathBuf::from("../data/cloud")
}

fn default_region_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_region_api_timeout() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nodes_file: default_nodes_file(),
            geo_file: default_geo_file(),
            cloud_data_dir: default_cloud_data_dir(),
            region_api_url: default_region_api_url(),
            region_api_timeout_secs: default_region_api_timeout(),
            log_format: LogFormat::default(),
        }
    }
}

impl Settings {
    /// Load settings from `path` (required when given) or the default
    /// config file (optional), then the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(default_path) = Self::config_path() {
                    builder = builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let config = builder
            .add_source(config::Environment::with_prefix("GEOPATH"))
            .build()
            .context("Failed to read configuration")?;

        config
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    pub fn region_api_timeout(&self) -> Duration {
        Duration::from_secs(self.region_api_timeout_secs)
    }

    /// Get the default configuration file path
    fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| home.join(".config").join("geopath").join("config.toml"))
    }
}
