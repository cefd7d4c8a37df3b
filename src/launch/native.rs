//! Launcher that runs the server as a child process

use crate::error::{LaunchError, LaunchResult};
use crate::launch::{LaunchCommand, LaunchOutcome, ProcessLauncher};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Runs the server in the foreground, sharing the terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeLauncher;

impl NativeLauncher {
    /// Create a native launcher
    pub fn new() -> Self {
        Self
    }

    fn outcome(status: ExitStatus) -> LaunchResult<LaunchOutcome> {
        if status.success() {
            return Ok(LaunchOutcome::Exited);
        }
        if let Some(code) = status.code() {
            return Err(LaunchError::ServerExited { code });
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                if signal == libc::SIGINT {
                    return Ok(LaunchOutcome::Interrupted);
                }
                return Err(LaunchError::ServerExited { code: 128 + signal });
            }
        }

        Err(LaunchError::ServerExited { code: -1 })
    }
}

#[async_trait]
impl ProcessLauncher for NativeLauncher {
    async fn launch(&self, command: &LaunchCommand) -> LaunchResult<LaunchOutcome> {
        debug!("Executing interactively: {} {:?}", command.program, command.args);

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LaunchError::command_failed(command.to_string(), e))?;

        let wait_err =
            |e: std::io::Error| LaunchError::io(format!("waiting for {}", command.program), e);

        // The terminal delivers SIGINT to the server too; wait for it to exit.
        let interrupted = tokio::select! {
            status = child.wait() => return Self::outcome(status.map_err(wait_err)?),
            signal = tokio::signal::ctrl_c() => signal.is_ok(),
        };

        if !interrupted {
            warn!("Could not listen for Ctrl-C, waiting for {}", command.program);
            let status = child.wait().await.map_err(wait_err)?;
            return Self::outcome(status);
        }

        info!("Interrupted, waiting for {} to exit", command.program);
        tokio::select! {
            status = child.wait() => {
                status.map_err(wait_err)?;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted again, killing {}", command.program);
                child
                    .kill()
                    .await
                    .map_err(|e| LaunchError::io(format!("killing {}", command.program), e))?;
            }
        }

        Ok(LaunchOutcome::Interrupted)
    }
}
