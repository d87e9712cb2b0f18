//! OS signal handling.
//!
//! SIGINT (Ctrl+C) and, on Unix, SIGTERM trigger the shared shutdown
//! signal. The listener also exits when shutdown is triggered from
//! elsewhere so it never outlives the watcher.

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::Shutdown;

#[cfg(unix)]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.map(|_| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_termination() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|_| "ctrl-c")
}

/// Spawn the background listener that turns a termination signal into a
/// shutdown trigger.
pub fn spawn_listener(shutdown: Shutdown) -> JoinHandle<()> {
    let mut signal = shutdown.subscribe();
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_termination() => match res {
                Ok(name) => {
                    tracing::info!(signal = name, "Termination signal received, stopping");
                    shutdown.trigger();
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to install signal handler");
                }
            },
            _ = signal.recv() => {}
        }
    })
}
