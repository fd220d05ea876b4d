use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::ServiceConfig;

/// Time given to in-flight requests after SIGTERM before shutdown starts.
const SIGTERM_GRACE: Duration = Duration::from_secs(10);

/// Spawn a task that resolves on SIGINT, SIGTERM (after a grace period) or
/// a send on the returned sender, then notifies every receiver.
pub fn graceful_shutdown_blocker(
) -> std::io::Result<(JoinHandle<()>, watch::Sender<()>, watch::Receiver<()>)> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    let (tx, rx) = watch::channel(());
    let notify = tx.clone();
    let mut requested = rx.clone();

    let task = tokio::spawn(async move {
        let reason = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => {
                tokio::time::sleep(SIGTERM_GRACE).await;
                "SIGTERM"
            }
            _ = requested.changed() => "request",
        };
        tracing::info!(reason, "shutting down");
        let _ = notify.send(());
    });

    Ok((task, tx, rx))
}

pub fn register_panic_logger() {
    std::panic::set_hook(Box::new(|panic| match panic.location() {
        Some(loc) => tracing::error!(
            message = %panic,
            panic.file = loc.file(),
            panic.line = loc.line(),
        ),
        None => tracing::error!(message = %panic),
    }));
}

pub fn report_build_info(config: &ServiceConfig) {
    let build = common::prelude::build_info();
    tracing::info!(
        version = build.version,
        profile = build.build_profile,
        features = build.build_features,
        log_dir = ?config.log_dir,
        "quill starting up"
    );
}
