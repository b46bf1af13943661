use std::process::Stdio;

use log::{debug, info};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::core::errors::{Error, Result};

/// Run a command as a foreground process: the child inherits stdin/stdout/
/// stderr and owns the terminal until it exits or `cancel` fires.
///
/// Cancellation kills the child outright; the wrapped tools need no graceful
/// shutdown. A zero exit is `Ok`, a non-zero exit becomes `ExitCode` so the
/// CLI can propagate the child's own status, and a child terminated by a
/// signal (no exit code) is reported as `ExitCode(-1)`.
pub async fn run_interactive(mut cmd: Command, cancel: &CancellationToken) -> Result<()> {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    let mut child = cmd.spawn()?;
    debug!("interactive child started (pid {:?})", child.id());

    tokio::select! {
        _ = cancel.cancelled() => {
            info!("cancellation requested; killing interactive child");
            let _ = child.start_kill();
            let _ = child.wait().await;
            Err(Error::Cancelled)
        }
        status = child.wait() => {
            let status = status?;
            debug!("interactive child exited: {status}");
            if status.success() {
                Ok(())
            } else {
                Err(Error::ExitCode(status.code().unwrap_or(-1)))
            }
        }
    }
}
