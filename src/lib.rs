//! thile-launch - fetch hfile collections and start a local server
//!
//! Resolves a serving socket to its collections through the config
//! service, caches each collection's HDFS file locally, and launches the
//! server binary with `collection/partition=path` arguments.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod launch;
pub mod resolver;

pub use error::{LaunchError, LaunchResult};
