//! Stopping the inference server process.
//!
//! The server gets SIGTERM and `grace` to flush and exit on its own. After
//! that it is killed outright. Either way the child is reaped before
//! returning, so no zombie is left behind.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::{debug, warn};

/// Terminate `child` and wait for it, killing it if `grace` runs out.
///
/// Off Unix there is no polite signal to send, so the child is killed
/// immediately and `grace` is unused.
pub async fn shutdown_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if !request_exit(child)? {
        return child.wait().await;
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(pid = ?child.id(), ?grace, "Server ignored SIGTERM, killing it");
            child.kill().await?;
            child.wait().await
        }
    }
}

/// Ask the process to exit. Returns `false` when it is already gone.
#[cfg(unix)]
fn request_exit(child: &Child) -> io::Result<bool> {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    let Some(raw) = child.id() else {
        return Ok(false);
    };
    let pid = i32::try_from(raw)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    match kill(Pid::from_raw(pid), Signal::SIGTERM) {
        Ok(()) => {
            debug!(pid, "Sent SIGTERM");
            Ok(true)
        }
        Err(Errno::ESRCH) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}

#[cfg(not(unix))]
fn request_exit(child: &mut Child) -> io::Result<bool> {
    child.start_kill()?;
    Ok(child.id().is_some())
}
