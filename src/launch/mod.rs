//! Server launch
//!
//! Builds the server command line from the cached collections and runs it
//! in the foreground. Ctrl-C while the server runs ends the launcher
//! cleanly instead of being reported as a failure.

mod native;

pub use native::NativeLauncher;

use crate::error::LaunchResult;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

/// Flag passed to the server when collections should be mlocked
pub const MLOCK_FLAG: &str = "--mlock";

/// Command line for the serving binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Executable path
    pub program: String,
    /// Arguments, in order; cache paths are passed through unconverted
    pub args: Vec<OsString>,
}

impl LaunchCommand {
    /// Build `binary [--mlock] [extra...] key=path...`
    ///
    /// `extra` goes before the collection pairs since the server stops
    /// parsing flags at its first positional argument.
    pub fn build(
        binary: impl Into<String>,
        mlock: bool,
        extra: &[String],
        downloaded: &BTreeMap<String, PathBuf>,
    ) -> Self {
        let mut args: Vec<OsString> = Vec::with_capacity(downloaded.len() + extra.len() + 1);
        if mlock {
            args.push(MLOCK_FLAG.into());
        }
        args.extend(extra.iter().map(OsString::from));
        args.extend(downloaded.iter().map(|(key, local)| {
            let mut pair = OsString::from(key);
            pair.push("=");
            pair.push(local);
            pair
        }));

        Self {
            program: binary.into(),
            args,
        }
    }

    /// Full argument vector including the program
    pub fn argv(&self) -> Vec<OsString> {
        let mut argv = Vec::with_capacity(self.args.len() + 1);
        argv.push(OsString::from(&self.program));
        argv.extend(self.args.iter().cloned());
        argv
    }
}

impl fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv: Vec<_> = self
            .argv()
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        write!(f, "{}", argv.join(" "))
    }
}

/// How a launched server finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Server exited with status 0
    Exited,
    /// Run was interrupted with Ctrl-C
    Interrupted,
}

/// Runs the server command
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Run `command` in the foreground until it exits
    async fn launch(&self, command: &LaunchCommand) -> LaunchResult<LaunchOutcome>;
}
