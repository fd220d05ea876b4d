pub mod utils;

use std::net::SocketAddr;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::http_server;
use crate::service_state::StateSetupError;
use crate::{ServiceConfig, ServiceState};

const FINAL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
const LOG_FILE_NAME: &str = "quill.log";

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to install signal handlers: {0}")]
    Signals(std::io::Error),
    #[error("failed to set up content service: {0}")]
    State(#[from] StateSetupError),
    #[error("invalid http server configuration: {0}")]
    HttpConfig(#[from] http_server::ConfigError),
    #[error("service did not stop within {}s", FINAL_SHUTDOWN_TIMEOUT.as_secs())]
    ShutdownTimeout,
}

/// Running service tasks plus the means to stop them.
pub struct ShutdownHandle {
    signal_task: JoinHandle<()>,
    tasks: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<()>,
}

impl ShutdownHandle {
    /// Block until a signal or [`ShutdownHandle::shutdown`] stops the
    /// service, then wait for every task to finish.
    pub async fn wait(self) -> Result<(), ProcessError> {
        let _ = self.signal_task.await;
        tokio::time::timeout(FINAL_SHUTDOWN_TIMEOUT, join_all(self.tasks))
            .await
            .map(|_| ())
            .map_err(|_| ProcessError::ShutdownTimeout)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn env_filter(config: &ServiceConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(config.log_level.into())
        .from_env_lossy()
}

/// Install the global subscriber: compact stdout, plus a daily rolling file
/// when a log directory is configured. The returned guards flush on drop.
fn init_logging(config: &ServiceConfig) -> Vec<WorkerGuard> {
    let mut guards = Vec::new();

    let (stdout_writer, guard) = tracing_appender::non_blocking(std::io::stdout());
    guards.push(guard);
    let stdout_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(stdout_writer)
        .with_filter(env_filter(config));

    let file_layer = config.log_dir.as_ref().and_then(|log_dir| {
        if let Err(e) = std::fs::create_dir_all(log_dir) {
            eprintln!("cannot create log directory {}: {}", log_dir.display(), e);
            return None;
        }
        let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
        let (file_writer, guard) = tracing_appender::non_blocking(appender);
        guards.push(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(env_filter(config)),
        )
    });

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .init();

    utils::register_panic_logger();
    utils::report_build_info(config);

    guards
}

/// Build the content state and spawn the HTTP server.
///
/// Shutdown is driven by SIGINT/SIGTERM or by [`ShutdownHandle::shutdown`].
/// Once it begins the content loader is closed so readiness reports the
/// service as going away.
pub async fn start_service(
    config: &ServiceConfig,
) -> Result<(ServiceState, ShutdownHandle), ProcessError> {
    let (signal_task, shutdown_tx, shutdown_rx) =
        utils::graceful_shutdown_blocker().map_err(ProcessError::Signals)?;
    let state = ServiceState::from_config(config).await?;

    let listen_addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let mut http_config =
        http_server::Config::new(listen_addr)?.with_log_level(config.log_level);
    if let Some(ref public_url) = config.public_url {
        http_config = http_config.with_public_url(public_url.clone());
    }

    let server_state = state.clone();
    let server_rx = shutdown_rx.clone();
    let server = tokio::spawn(async move {
        if let Err(e) = http_server::run_api(http_config, server_state, server_rx).await {
            tracing::error!(error = %e, "http server stopped with an error");
        }
    });

    let closing_state = state.clone();
    let mut closing_rx = shutdown_rx;
    let closer = tokio::spawn(async move {
        let _ = closing_rx.changed().await;
        closing_state.close();
    });

    tracing::info!(
        content_root = %config.content_root.display(),
        root_type = %config.root_type,
        port = config.port,
        "serving content api and preview"
    );

    Ok((
        state,
        ShutdownHandle {
            signal_task,
            tasks: vec![server, closer],
            shutdown_tx,
        },
    ))
}

/// Run the service until it is told to stop. Used by `quill serve`.
pub async fn spawn_service(config: &ServiceConfig) -> Result<(), ProcessError> {
    let _guards = init_logging(config);
    let (_, handle) = match start_service(config).await {
        Ok(started) => started,
        Err(e) => {
            tracing::error!(error = %e, "failed to start");
            return Err(e);
        }
    };
    handle.wait().await
}
