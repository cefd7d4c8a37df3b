//! CLI argument definitions using clap derive

use crate::config::{Config, LaunchSettings};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

/// Fetch hfile collections for a serving socket and launch the local server
///
/// Looks up which collections a socket serves, copies any files missing
/// from the local cache out of HDFS, then prints (or with --run, executes)
/// the server command line.
#[derive(Parser, Debug)]
#[command(name = "thile-launch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Socket (host/port) to read collection configs for
    #[arg(required_unless_present = "write_config")]
    pub socket: Option<String>,

    /// Increase verbosity (-v paths and commands, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Actually start the server (default is a dry run)
    #[arg(long)]
    pub run: bool,

    /// Pass --mlock to the server
    #[arg(long)]
    pub lock: bool,

    /// Path to the server binary
    #[arg(long)]
    pub binary: Option<String>,

    /// Directory to write downloaded files to
    #[arg(long)]
    pub local: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, env = "THILE_LAUNCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Write the default configuration file and exit
    #[arg(long, conflicts_with = "run")]
    pub write_config: bool,

    /// Extra arguments for the server, placed before the collection pairs
    #[arg(last = true)]
    pub server_args: Vec<String>,
}

impl Cli {
    /// Whether paths and command lines should be printed
    pub fn is_verbose(&self) -> bool {
        self.verbose > 0
    }

    /// Effective settings: config file values overridden by flags
    pub fn settings(&self, config: &Config) -> LaunchSettings {
        let mut settings = LaunchSettings::from(config);
        if let Some(ref binary) = self.binary {
            settings.binary = binary.clone();
        }
        if let Some(ref dir) = self.local {
            settings.cache_dir = dir.clone();
        }
        settings.mlock |= self.lock;
        settings
    }
}
