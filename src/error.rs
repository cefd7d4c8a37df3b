//! Error types for thile-launch
//!
//! All modules use `LaunchResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for thile-launch operations
pub type LaunchResult<T> = Result<T, LaunchError>;

/// All errors that can occur while resolving, fetching and launching
#[derive(Error, Debug)]
pub enum LaunchError {
    // Socket config errors
    #[error("Failed to fetch socket config from {url}: {reason}")]
    ConfigFetch { url: String, reason: String },

    #[error("Malformed socket config from {url}: {reason}")]
    ConfigParse { url: String, reason: String },

    // Settings file errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Download errors
    #[error("Copy of {remote} failed, exit code: {code}")]
    CopyFailed { remote: String, code: i32 },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server exited with code {code}")]
    ServerExited { code: i32 },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl LaunchError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Process exit status to report for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::ServerExited { code } | Self::CopyFailed { code, .. } => {
                u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::CommandFailed { source, .. }
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Some("Check that the program is installed and on PATH (see --binary and [hdfs] copy_tool)")
            }
            Self::ConfigFetch { .. } => Some("Check the socket name and [service] base_url"),
            _ => None,
        }
    }
}
