//! Process signal listeners
//!
//! Each signal maps to a shutdown cause so the recorded shutdown event
//! says how the process was stopped: Ctrl+C is a user interrupt, while
//! terminate/hang-up (or close/logoff/power-off on Windows) count as a
//! system shutdown. The coordinator keeps only the first cause, so a
//! burst of signals produces one clean teardown.

use deskwatch_core::{ShutdownCause, ShutdownCoordinator};

/// Spawn background listeners that turn process signals into shutdown
/// requests. Must be called from within a tokio runtime.
#[cfg(unix)]
pub fn spawn_listeners(coordinator: &ShutdownCoordinator) {
    use tokio::signal::unix::{signal, SignalKind};

    let interrupt = coordinator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.request(ShutdownCause::UserInterrupt);
        }
    });

    for kind in [SignalKind::terminate(), SignalKind::hangup()] {
        let handle = coordinator.clone();
        tokio::spawn(async move {
            match signal(kind) {
                Ok(mut stream) => {
                    stream.recv().await;
                    handle.request(ShutdownCause::SystemShutdown);
                }
                Err(e) => tracing::warn!(error = %e, "failed to install signal handler"),
            }
        });
    }
}

#[cfg(windows)]
pub fn spawn_listeners(coordinator: &ShutdownCoordinator) {
    use tokio::signal::windows;

    let interrupt = coordinator.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.request(ShutdownCause::UserInterrupt);
        }
    });

    let handle = coordinator.clone();
    tokio::spawn(async move {
        match windows::ctrl_break() {
            Ok(mut stream) => {
                stream.recv().await;
                handle.request(ShutdownCause::SystemShutdown);
            }
            Err(e) => tracing::warn!(error = %e, "failed to install break handler"),
        }
    });

    let handle = coordinator.clone();
    tokio::spawn(async move {
        match windows::ctrl_close() {
            Ok(mut stream) => {
                stream.recv().await;
                handle.request(ShutdownCause::SystemShutdown);
            }
            Err(e) => tracing::warn!(error = %e, "failed to install close handler"),
        }
    });

    let handle = coordinator.clone();
    tokio::spawn(async move {
        match windows::ctrl_logoff() {
            Ok(mut stream) => {
                stream.recv().await;
                handle.request(ShutdownCause::SystemShutdown);
            }
            Err(e) => tracing::warn!(error = %e, "failed to install logoff handler"),
        }
    });

    let handle = coordinator.clone();
    tokio::spawn(async move {
        match windows::ctrl_shutdown() {
            Ok(mut stream) => {
                stream.recv().await;
                handle.request(ShutdownCause::SystemShutdown);
            }
            Err(e) => tracing::warn!(error = %e, "failed to install shutdown handler"),
        }
    });
}
