//! # Termination signal handling for [`Supervisor::run`](crate::Supervisor::run).
//!
//! Unix: `SIGINT`, `SIGTERM`, `SIGQUIT` and `SIGHUP` (the emulator host
//! closing the terminal session). Elsewhere: Ctrl-C only.

use tracing::info;

/// Completes when the process receives a termination signal.
///
/// Returns the signal name, or `Err` if signal registration fails.
#[cfg(unix)]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;
    let mut sighup = signal(SignalKind::hangup())?;

    let name = tokio::select! {
        _ = sigint.recv()  => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
        _ = sighup.recv()  => "SIGHUP",
    };
    info!(signal = name, "termination signal received");
    Ok(name)
}

/// Completes when the process receives Ctrl-C.
#[cfg(not(unix))]
pub(crate) async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    info!(signal = "ctrl-c", "termination signal received");
    Ok("ctrl-c")
}
