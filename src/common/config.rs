//! Configuration file handling

use serde::Deserialize;
use std::path::Path;

use super::paths::config_path;
use super::{Error, Result};
use crate::testing::OutputFormat;

/// Main configuration structure
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Baseline topology every case is built on
    #[serde(default)]
    pub topology: TopologyConfig,

    /// Report settings
    #[serde(default)]
    pub output: OutputConfig,

    /// Run settings
    #[serde(default)]
    pub run: RunConfig,
}

/// Baseline topology: one local instance, one neighbor, one peer-group
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TopologyConfig {
    /// Local autonomous system
    #[serde(default = "default_local_asn")]
    pub local_asn: u32,

    /// Remote autonomous system of an external neighbor
    #[serde(default = "default_peer_asn")]
    pub peer_asn: u32,

    /// Neighbor address
    #[serde(default = "default_peer_address")]
    pub peer_address: String,

    /// Interface name used for interface neighbors
    #[serde(default = "default_peer_interface")]
    pub peer_interface: String,

    /// Peer-group name
    #[serde(default = "default_peer_group")]
    pub peer_group: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            local_asn: default_local_asn(),
            peer_asn: default_peer_asn(),
            peer_address: default_peer_address(),
            peer_interface: default_peer_interface(),
            peer_group: default_peer_group(),
        }
    }
}

fn default_local_asn() -> u32 {
    100
}
fn default_peer_asn() -> u32 {
    200
}
fn default_peer_address() -> String {
    "1.1.1.1".to_string()
}
fn default_peer_interface() -> String {
    "IP-TEST".to_string()
}
fn default_peer_group() -> String {
    "PG-TEST".to_string()
}

/// Report configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Report format
    #[serde(default)]
    pub format: OutputFormat,

    /// Colored glyphs in text reports
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

/// Run configuration
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Exit with status 1 when any case failed
    #[serde(default)]
    pub strict: bool,
}

impl Config {
    /// Load configuration from an explicit file, or the default config file
    ///
    /// Returns default configuration if no file is given and the default
    /// file doesn't exist
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }
}
