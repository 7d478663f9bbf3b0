//! Child teardown: stdin EOF, then SIGTERM, then SIGKILL.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Grace period for each escalation phase.
pub const GRACE_PERIOD: Duration = Duration::from_secs(2);

/// Stop a child whose stdin has already been closed, and reap it.
///
/// 1. Wait up to `grace` for the server to exit on EOF
/// 2. Send SIGTERM and wait up to `grace` again
/// 3. SIGKILL and wait for reaping
///
/// On non-Unix platforms phase 2 is skipped.
pub async fn terminate_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            #[allow(clippy::cast_possible_wrap)]
            match signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
                Ok(()) => {
                    if let Ok(result) = timeout(grace, child.wait()).await {
                        return result;
                    }
                }
                Err(nix::errno::Errno::ESRCH) => return child.wait().await,
                Err(e) => return Err(io::Error::other(e)),
            }
        }
    }

    tracing::debug!("Server did not exit in time, killing");
    child.kill().await?;
    child.wait().await
}
