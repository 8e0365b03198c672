//! Alert watcher.
//!
//! `timetrack start --alert` launches `timetrack watch <id>` as a detached
//! process. The watcher re-reads the entry on a fixed interval, notifies once
//! when the tracked time reaches the threshold, and exits when the entry is
//! no longer active or a shutdown signal arrives. It never writes to the
//! store.

use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use timetrack_core::{AlertMonitor, EntryStore, Notifier, Timestamp, WatchStep};

/// Why the watcher stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    Alerted,
    /// The entry was stopped, paused, deleted, or replaced.
    EntryFinished,
    Cancelled,
}

/// Launches `timetrack watch` in the background and returns immediately.
#[expect(
    clippy::zombie_processes,
    reason = "the watcher is meant to outlive this process"
)]
pub fn spawn_detached(entry_id: i64, threshold: i64, config_path: Option<&Path>) -> Result<()> {
    let exe = std::env::current_exe().context("failed to locate the timetrack executable")?;
    let mut command = Command::new(exe);
    command
        .arg("watch")
        .arg(entry_id.to_string())
        .arg("--threshold")
        .arg(threshold.to_string());
    if let Some(path) = config_path {
        command.arg("--config").arg(path);
    }
    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Own process group so the terminal's Ctrl-C does not reach it.
        command.process_group(0);
    }

    let child = command.spawn().context("failed to start alert watcher")?;
    tracing::debug!(pid = child.id(), entry_id, threshold, "alert watcher started");
    Ok(())
}

/// Runs the watcher to completion on a single-threaded runtime.
pub fn run<S: EntryStore, N: Notifier>(
    store: &S,
    notifier: &N,
    monitor: AlertMonitor,
    poll: Duration,
) -> Result<WatchOutcome> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let cancel = CancellationToken::new();
    let outcome = runtime.block_on(async {
        tokio::spawn(cancel_on_shutdown(cancel.clone()));
        watch(store, notifier, monitor, poll, &cancel, timetrack_core::entry::now).await
    });
    tracing::debug!(?outcome, "alert watcher finished");
    Ok(outcome)
}

/// Polls the watched entry every `poll` until the monitor finishes or
/// `cancel` fires.
///
/// The first poll happens immediately. Read failures are logged and
/// retried on the next tick.
pub async fn watch<S, N, C>(
    store: &S,
    notifier: &N,
    mut monitor: AlertMonitor,
    poll: Duration,
    cancel: &CancellationToken,
    clock: C,
) -> WatchOutcome
where
    S: EntryStore,
    N: Notifier,
    C: Fn() -> Timestamp,
{
    let mut ticker = tokio::time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return WatchOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        let entry = match store.get_by_id(monitor.entry_id()) {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    entry_id = monitor.entry_id(),
                    "failed to read watched entry"
                );
                continue;
            }
        };

        match monitor.check(entry.as_ref(), clock()) {
            WatchStep::Wait => {}
            WatchStep::Alert(alert) => {
                notifier.notify(&alert);
                return WatchOutcome::Alerted;
            }
            WatchStep::Finished => return WatchOutcome::EntryFinished,
        }
    }
}

/// Cancels `cancel` on Ctrl-C or SIGTERM.
async fn cancel_on_shutdown(cancel: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => {
                        if let Err(err) = result {
                            tracing::warn!(error = %err, "failed to listen for Ctrl-C");
                            sigterm.recv().await;
                        }
                    }
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "failed to install SIGTERM handler");
                wait_for_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    wait_for_ctrl_c().await;

    tracing::debug!("shutdown signal received");
    cancel.cancel();
}

async fn wait_for_ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
