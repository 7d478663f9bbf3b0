//! Signal-driven cancellation of in-flight session operations.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::SessionError;

/// Cancels a token when SIGINT or SIGTERM arrives.
///
/// Handlers are registered in [`SignalGuard::install`], so a signal that
/// arrives after it returns is never missed. The watcher task is aborted on
/// drop.
#[derive(Debug)]
pub struct SignalGuard {
    token: CancellationToken,
    watcher: JoinHandle<()>,
}

impl SignalGuard {
    /// Register handlers and start watching. Must be called inside a runtime.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let token = CancellationToken::new();
        let trigger = token.clone();

        let watcher = tokio::spawn(async move {
            tokio::select! {
                _ = interrupt.recv() => tracing::debug!("SIGINT received"),
                _ = terminate.recv() => tracing::debug!("SIGTERM received"),
            }
            trigger.cancel();
        });

        Ok(Self { token, watcher })
    }

    /// Register handlers and start watching. Must be called inside a runtime.
    #[cfg(not(unix))]
    pub fn install() -> std::io::Result<Self> {
        let token = CancellationToken::new();
        let trigger = token.clone();

        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::debug!("Ctrl-C received");
                trigger.cancel();
            }
        });

        Ok(Self { token, watcher })
    }

    /// A guard driven by an external token instead of OS signals.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            watcher: tokio::spawn(async {}),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Race `operation` against `token`.
///
/// The token is polled first, so an already-cancelled token never starts the
/// operation. The operation future is dropped on cancel; callers are
/// responsible for tearing down whatever it was using.
pub async fn run_cancellable<T, F>(token: &CancellationToken, operation: F) -> Result<T, SessionError>
where
    F: Future<Output = Result<T, SessionError>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(SessionError::Interrupted),
        result = operation => result,
    }
}
