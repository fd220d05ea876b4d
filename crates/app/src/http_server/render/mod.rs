use std::path::{Path as FsPath, PathBuf};

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Router};
use serde::Deserialize;
use tower_http::services::ServeDir;

use common::edit::{EditError, Resolved};
use common::path::ContentPath;
use common::render::{inject_live_reload, OutputType, RenderError, RenderRequest, UrlConfig};

mod preview;

pub use preview::PreviewRenderer;

use super::Config;
use crate::ServiceState;

/// File name of a rendered page inside its output directory.
pub const RENDERED_PAGE: &str = "index.html";

/// Where the preview pages subscribe for reload events.
pub const EVENTS_PATH: &str = "/api/v0/events";

#[derive(Debug, Default, Deserialize)]
pub struct RenderQuery {
    /// `json` for the node's document, anything else renders html
    #[serde(default)]
    pub output: Option<String>,
}

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/render", get(root_handler))
        .route("/render/", get(root_handler))
        .route("/render/*path", get(handler))
        .with_state(state)
}

/// Files from the render output directory, then the configured static
/// directory. Without a static directory only render output is served.
pub fn static_files(state: &ServiceState) -> ServeDir<ServeDir> {
    let fallback = state.static_dir().unwrap_or_else(|| state.render_dir());
    ServeDir::new(state.render_dir()).fallback(ServeDir::new(fallback))
}

pub async fn root_handler(
    state: State<ServiceState>,
    config: Extension<Config>,
    query: Query<RenderQuery>,
) -> Result<Response, RenderPageError> {
    render(state, config, query, "/").await
}

pub async fn handler(
    state: State<ServiceState>,
    config: Extension<Config>,
    query: Query<RenderQuery>,
    Path(path): Path<String>,
) -> Result<Response, RenderPageError> {
    render(state, config, query, &format!("/{}", path)).await
}

async fn render(
    State(state): State<ServiceState>,
    Extension(config): Extension<Config>,
    Query(query): Query<RenderQuery>,
    path: &str,
) -> Result<Response, RenderPageError> {
    let Resolved {
        tree,
        node,
        metadata,
    } = state.handler().resolve(path)?;
    let output = match query.output.as_deref() {
        Some("json") => OutputType::Json,
        _ => OutputType::Html,
    };

    let request = RenderRequest {
        node,
        metadata,
        tree,
        output,
        url_config: UrlConfig::new(config.public_url.clone()),
    };
    let body = state.renderer().render(&request)?;
    if output == OutputType::Html {
        emit_page(state.render_dir(), &request.node.path, &body).await;
    }

    Ok(match output {
        OutputType::Json => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        OutputType::Html => Html(inject_live_reload(&body, EVENTS_PATH)).into_response(),
    })
}

/// Output file for the page at `path`: `<render dir>/<segments>/index.html`.
pub fn rendered_page_path(render_dir: &FsPath, path: &ContentPath) -> PathBuf {
    let mut file = render_dir.to_path_buf();
    file.extend(path.segments());
    file.join(RENDERED_PAGE)
}

/// Store the page without the live-reload script so `/static` serves a
/// clean copy. A failed write only costs the static copy.
async fn emit_page(render_dir: &FsPath, path: &ContentPath, html: &str) {
    let file = rendered_page_path(render_dir, path);
    let written = match file.parent() {
        Some(dir) => match tokio::fs::create_dir_all(dir).await {
            Ok(()) => tokio::fs::write(&file, html).await,
            Err(e) => Err(e),
        },
        None => Ok(()),
    };
    match written {
        Ok(()) => tracing::debug!(file = %file.display(), "wrote rendered page"),
        Err(e) => tracing::warn!(file = %file.display(), error = %e, "failed to write rendered page"),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RenderPageError {
    #[error("content error: {0}")]
    Edit(#[from] EditError),
    #[error("render error: {0}")]
    Render(#[from] RenderError),
}

impl IntoResponse for RenderPageError {
    fn into_response(self) -> Response {
        match self {
            RenderPageError::Edit(EditError::NotFound(path)) => (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("no content at {}", path),
            )
                .into_response(),
            RenderPageError::Render(RenderError::Unsupported(type_name)) => (
                StatusCode::NOT_IMPLEMENTED,
                [(header::CONTENT_TYPE, "text/plain")],
                format!("no renderer for {}", type_name),
            )
                .into_response(),
            other => {
                tracing::error!(error = ?other, "failed to render page");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    [(header::CONTENT_TYPE, "text/plain")],
                    "internal server error",
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_page_path() {
        let dir = FsPath::new("/out");
        assert_eq!(
            rendered_page_path(dir, &ContentPath::root()),
            PathBuf::from("/out/index.html")
        );
        assert_eq!(
            rendered_page_path(dir, &ContentPath::parse("/blog/post-1").unwrap()),
            PathBuf::from("/out/blog/post-1/index.html")
        );
    }
}
