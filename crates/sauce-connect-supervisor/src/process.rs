//! Tunnel subprocess handling

use std::path::Path;
use std::process::ExitStatus;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// Errors launching the tunnel process
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the spawned tunnel process.
///
/// The process and the remote tunnel are independent resources; either may
/// outlive the other transiently. The supervisor reconciles both during
/// teardown.
#[derive(Debug)]
pub struct TunnelProcess {
    child: Child,
}

impl TunnelProcess {
    /// Spawn the tunnel process.
    ///
    /// stdout/stderr are inherited, not consumed.
    pub fn launch(program: &Path, args: &[String]) -> Result<Self, LaunchError> {
        let child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        info!(
            pid = ?child.id(),
            program = %program.display(),
            "tunnel process started"
        );
        Ok(Self { child })
    }

    /// OS pid, if the process has not been reaped yet.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Best-effort, non-blocking liveness check.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to terminate for any reason, including being
    /// killed by the supervisor itself.
    ///
    /// Cancel-safe; callers select over this as the termination event.
    /// Completed status is cached, so waiting again after exit returns
    /// immediately.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        self.child.wait().await
    }

    /// Kill the process. Killing an already-exited process is a no-op.
    pub async fn kill(&mut self) {
        match self.child.kill().await {
            Ok(()) => debug!("tunnel process killed"),
            // Already exited
            Err(err) => debug!(error = %err, "kill skipped"),
        }
    }
}
