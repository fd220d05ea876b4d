use axum::extract::DefaultBodyLimit;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;

pub mod api;
mod config;
mod handlers;
pub mod health;
pub mod render;

pub use config::{Config, ConfigError};

use crate::ServiceState;

/// Largest accepted request body, which bounds a single upload (500 MB)
pub const MAX_UPLOAD_SIZE_BYTES: usize = 500 * 1024 * 1024;

/// Every route the service answers:
///
/// - `/_status/{livez,readyz,version}`
/// - `/api/v0/...` content API and event stream
/// - `/render/...` preview pages
/// - `/static/...` render output, then the static directory
pub fn router(config: Config, state: ServiceState) -> Router {
    let static_files = render::static_files(&state);

    Router::new()
        .nest("/_status", health::router(state.clone()))
        .nest("/api", api::router(state.clone()))
        .merge(render::router(state.clone()))
        .nest_service("/static", static_files)
        .fallback(handlers::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .layer(Extension(config))
        .with_state(state)
}

/// Bind and serve until the shutdown watch fires.
pub async fn run_api(
    config: Config,
    state: ServiceState,
    mut shutdown_rx: watch::Receiver<()>,
) -> Result<(), HttpServerError> {
    let listen_addr = config.listen_addr;
    let trace_layer = TraceLayer::new_for_http()
        .on_response(
            DefaultOnResponse::new()
                .level(config.log_level)
                .latency_unit(LatencyUnit::Micros),
        )
        .on_failure(DefaultOnFailure::new().latency_unit(LatencyUnit::Micros));
    let app = router(config.clone(), state).layer(trace_layer);

    let listener = TcpListener::bind(listen_addr)
        .await
        .map_err(|source| HttpServerError::Bind {
            addr: listen_addr,
            source,
        })?;
    tracing::info!(addr = %listen_addr, public_url = %config.public_url, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.changed().await;
        })
        .await
        .map_err(HttpServerError::Serve)
}

#[derive(Debug, thiserror::Error)]
pub enum HttpServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        source: std::io::Error,
    },
    #[error("http server failed: {0}")]
    Serve(std::io::Error),
}
