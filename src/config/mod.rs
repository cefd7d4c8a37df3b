//! Configuration management for thile-launch

pub mod schema;

pub use schema::Config;

use crate::error::{LaunchError, LaunchResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// The settings file, at `--config` or the per-user default location
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    /// Use `path`, or the default location when none is given
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path: path.unwrap_or_else(Self::default_path),
        }
    }

    /// `<config dir>/thile-launch/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("thile-launch")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file, falling back to defaults when it does not exist
    pub async fn load(&self) -> LaunchResult<Config> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.path.display());
                return Ok(Config::default());
            }
            Err(e) => {
                return Err(LaunchError::io(
                    format!("reading config from {}", self.path.display()),
                    e,
                ))
            }
        };

        toml::from_str(&content).map_err(|e| LaunchError::ConfigInvalid {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Write the default settings, refusing to replace an existing file
    pub async fn write_default(&self) -> LaunchResult<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            return Err(LaunchError::User(format!(
                "{} already exists",
                self.path.display()
            )));
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| LaunchError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(&Config::default())?;
        fs::write(&self.path, content).await.map_err(|e| {
            LaunchError::io(format!("writing config to {}", self.path.display()), e)
        })?;

        info!("Default configuration written to {}", self.path.display());
        Ok(())
    }
}

/// Effective settings for one run: file values with CLI overrides applied
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub strip_prefix: String,
    pub copy_tool: String,
    pub binary: String,
    pub mlock: bool,
    pub cache_dir: PathBuf,
}

impl From<&Config> for LaunchSettings {
    fn from(config: &Config) -> Self {
        let timeout = match config.service.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Self {
            base_url: config.service.base_url.clone(),
            timeout,
            strip_prefix: config.hdfs.strip_prefix.clone(),
            copy_tool: config.hdfs.copy_tool.clone(),
            binary: config.server.binary.clone(),
            mlock: config.server.mlock,
            cache_dir: config.cache.resolved_dir(),
        }
    }
}
