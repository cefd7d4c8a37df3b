//! Fetching HDFS files into the local cache
//!
//! Entries are fetched one at a time. The first failure aborts the run;
//! files copied earlier in the same run are left in place.

use crate::cache::path::local_path;
use crate::error::{LaunchError, LaunchResult};
use crate::resolver::CollectionSet;
use async_trait::async_trait;
use console::style;
use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

/// Copies one remote file to a local path
#[async_trait]
pub trait RemoteCopier: Send + Sync {
    /// Copy `remote` to `local`, blocking until the copy finishes
    async fn copy_to_local(&self, remote: &str, local: &Path) -> LaunchResult<()>;

    /// Human-readable description of the copy, shown in verbose output
    fn describe(&self, remote: &str, local: &Path) -> String {
        format!("{} -> {}", remote, local.display())
    }
}

/// Copier that shells out to `<tool> fs -copyToLocal <remote> <local>`
#[derive(Debug, Clone)]
pub struct HadoopCopier {
    tool: String,
}

impl HadoopCopier {
    /// Create a copier using the given hadoop executable
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    fn args(remote: &str, local: &Path) -> Vec<OsString> {
        vec![
            "fs".into(),
            "-copyToLocal".into(),
            remote.into(),
            local.as_os_str().to_owned(),
        ]
    }
}

impl Default for HadoopCopier {
    fn default() -> Self {
        Self::new("hadoop")
    }
}

#[async_trait]
impl RemoteCopier for HadoopCopier {
    async fn copy_to_local(&self, remote: &str, local: &Path) -> LaunchResult<()> {
        let args = Self::args(remote, local);
        debug!("Executing: {} {:?}", self.tool, args);

        let status = Command::new(&self.tool)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| LaunchError::command_failed(self.describe(remote, local), e))?;

        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::CopyFailed {
                remote: remote.to_string(),
                code: status.code().unwrap_or(-1),
            })
        }
    }

    fn describe(&self, remote: &str, local: &Path) -> String {
        let mut parts = vec![self.tool.clone()];
        parts.extend(
            Self::args(remote, local)
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned()),
        );
        parts.join(" ")
    }
}

/// Result of ensuring one entry is cached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File was already present; nothing was copied
    Cached,
    /// File was copied from the remote store
    Downloaded,
}

/// Materializes remote files in the cache directory
pub struct Fetcher {
    cache_dir: PathBuf,
    copier: Box<dyn RemoteCopier>,
    verbose: bool,
}

impl Fetcher {
    /// Create a fetcher writing into `cache_dir`
    pub fn new(cache_dir: impl Into<PathBuf>, copier: Box<dyn RemoteCopier>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            copier,
            verbose: false,
        }
    }

    /// Print local paths and copy commands
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Cache directory
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Copy `remote` to `local` unless `local` already exists
    pub async fn ensure_local(
        &self,
        key: &str,
        remote: &str,
        local: &Path,
    ) -> LaunchResult<FetchOutcome> {
        let exists = fs::try_exists(local)
            .await
            .map_err(|e| LaunchError::io(format!("checking {}", local.display()), e))?;

        if exists {
            println!("\t{} already exists locally.", style(key).cyan());
            if self.verbose {
                println!("\t\t{}", local.display());
            }
            return Ok(FetchOutcome::Cached);
        }

        println!("\tDownloading {}...", style(key).cyan());
        if self.verbose {
            println!("\t {}", self.copier.describe(remote, local));
        }

        if let Some(parent) = local.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                LaunchError::io(format!("creating cache directory {}", parent.display()), e)
            })?;
        }

        self.copier.copy_to_local(remote, local).await?;
        debug!("Fetched {} to {}", key, local.display());
        Ok(FetchOutcome::Downloaded)
    }

    /// Ensure every collection is cached, returning `key -> local path`
    pub async fn fetch_all(
        &self,
        collections: &CollectionSet,
    ) -> LaunchResult<BTreeMap<String, PathBuf>> {
        let mut downloaded = BTreeMap::new();
        let mut slots: HashMap<PathBuf, &str> = HashMap::new();

        for (key, remote) in collections {
            let local = local_path(&self.cache_dir, remote);

            if let Some(other) = slots.insert(local.clone(), remote) {
                if other != remote.as_str() {
                    warn!(
                        "{} and {} map to the same cache file {}",
                        other,
                        remote,
                        local.display()
                    );
                }
            }

            self.ensure_local(key, remote, &local).await?;
            downloaded.insert(key.clone(), local);
        }

        Ok(downloaded)
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("cache_dir", &self.cache_dir)
            .field("verbose", &self.verbose)
            .finish_non_exhaustive()
    }
}
