//! Configuration schema for thile-launch
//!
//! Configuration is stored at `~/.config/thile-launch/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket config service settings
    pub service: ServiceConfig,

    /// HDFS access settings
    pub hdfs: HdfsConfig,

    /// Serving binary settings
    pub server: ServerConfig,

    /// Local cache settings
    pub cache: CacheConfig,
}

/// Socket config service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// URL the socket name is appended to
    pub base_url: String,

    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://zk-web-prod/foursquare/config/hfileservice/sockets/".to_string(),
            timeout_secs: 30,
        }
    }
}

/// HDFS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HdfsConfig {
    /// Prefix removed from configured paths to get the HDFS path
    pub strip_prefix: String,

    /// Tool invoked as `<tool> fs -copyToLocal <remote> <local>`
    pub copy_tool: String,
}

impl Default for HdfsConfig {
    fn default() -> Self {
        Self {
            strip_prefix: "/hdfs/hadoop-alidoro-nn-vip".to_string(),
            copy_tool: "hadoop".to_string(),
        }
    }
}

/// Serving binary settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Path to the server executable
    pub binary: String,

    /// Pass --mlock to the server
    pub mlock: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary: "./thile".to_string(),
            mlock: false,
        }
    }
}

/// Local cache settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory for downloaded files (defaults to the system temp dir)
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    /// Cache directory, falling back to the system temp dir
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
