//! Socket config resolution
//!
//! Looks up the collections a socket is configured to serve from the
//! remote config service and maps each one to its HDFS path.

use crate::error::{LaunchError, LaunchResult};
use serde::Deserialize;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Partition of a collection as the config service sends it
///
/// The service is not strict about the type, so both JSON numbers and
/// strings are accepted and rendered verbatim into the key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Partition {
    Number(serde_json::Number),
    Name(String),
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Number(n) => write!(f, "{}", n),
            Partition::Name(name) => f.write_str(name),
        }
    }
}

/// One collection entry of a socket config response
#[derive(Debug, Clone, Deserialize)]
pub struct CollectionEntry {
    /// Collection name
    pub collection: String,
    /// Partition; missing or null means 0
    #[serde(default)]
    pub partition: Option<Partition>,
    /// Configured path, including the filesystem prefix
    pub path: String,
}

impl CollectionEntry {
    /// Key used on the server command line: `<collection>/<partition>`
    pub fn key(&self) -> String {
        match &self.partition {
            Some(partition) => format!("{}/{}", self.collection, partition),
            None => format!("{}/0", self.collection),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SocketConfig {
    collections: Vec<CollectionEntry>,
}

/// Collections to serve, keyed by `<collection>/<partition>`
///
/// Iteration is in key order. Inserting an existing key replaces its path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSet {
    entries: BTreeMap<String, String>,
}

impl CollectionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a remote path for a key, returning the replaced path if any
    pub fn insert(&mut self, key: impl Into<String>, remote: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), remote.into())
    }

    /// Remote path configured for a key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Iterate `(key, remote_path)` in key order
    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// Keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a CollectionSet {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Strip the filesystem prefix from a configured path
///
/// Paths without the prefix are returned unchanged.
pub fn canonical_remote_path<'a>(path: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some(stripped) => stripped,
        None => {
            debug!("Path {} does not start with {}, using as-is", path, prefix);
            path
        }
    }
}

/// Parse a socket config response body into a collection set
pub fn parse_collections(body: &str, prefix: &str) -> Result<CollectionSet, serde_json::Error> {
    let config: SocketConfig = serde_json::from_str(body)?;
    debug!("Found {} collections in config", config.collections.len());

    let mut set = CollectionSet::new();
    for entry in &config.collections {
        let key = entry.key();
        let remote = canonical_remote_path(&entry.path, prefix);
        if let Some(previous) = set.insert(key.clone(), remote) {
            debug!("Collection {} listed twice, replacing {}", key, previous);
        }
    }
    Ok(set)
}

/// Client for the socket config service
#[derive(Debug, Clone)]
pub struct SocketConfigClient {
    base_url: String,
    strip_prefix: String,
    timeout: Option<Duration>,
}

impl SocketConfigClient {
    /// Create a client for a base URL
    pub fn new(base_url: impl Into<String>, strip_prefix: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            strip_prefix: strip_prefix.into(),
            timeout: None,
        }
    }

    /// Set the overall request timeout
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// URL for a socket's config
    pub fn url_for(&self, socket: &str) -> String {
        format!("{}{}", self.base_url, socket)
    }

    /// Fetch and parse the config for a socket
    pub async fn resolve(&self, socket: &str) -> LaunchResult<CollectionSet> {
        let url = self.url_for(socket);
        debug!("Fetching socket config from {}", url);

        let timeout = self.timeout;
        let request_url = url.clone();
        let body = tokio::task::spawn_blocking(move || fetch_body(&request_url, timeout))
            .await
            .map_err(|e| LaunchError::ConfigFetch {
                url: url.clone(),
                reason: e.to_string(),
            })??;

        parse_collections(&body, &self.strip_prefix).map_err(|e| LaunchError::ConfigParse {
            url,
            reason: e.to_string(),
        })
    }
}

fn fetch_body(url: &str, timeout: Option<Duration>) -> LaunchResult<String> {
    let config = ureq::Agent::config_builder()
        .timeout_global(timeout)
        .build();
    let agent = ureq::Agent::new_with_config(config);

    let fetch_err = |e: ureq::Error| LaunchError::ConfigFetch {
        url: url.to_string(),
        reason: e.to_string(),
    };

    let mut response = agent.get(url).call().map_err(fetch_err)?;
    response.body_mut().read_to_string().map_err(fetch_err)
}
