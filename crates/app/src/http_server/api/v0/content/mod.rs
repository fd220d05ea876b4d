use axum::http::HeaderMap;
use axum::routing::{get, patch, post};
use axum::Router;
use url::Url;

use crate::ServiceState;

pub mod commit;
pub mod create;
mod error;
pub mod reflect;
pub mod types;
pub mod update;
pub mod upload;

pub use commit::CommitRequest;
pub use create::BeginRequest;
pub use reflect::ReflectRequest;
pub use types::TypesRequest;
pub use update::UpdateRequest;

/// Header carrying the transaction token for upload and commit.
pub const TRANSACTION_HEADER: &str = "x-transaction";

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/types", get(types::handler))
        .route("/reflect", get(reflect::root_handler))
        .route("/reflect/*path", get(reflect::handler))
        .route("/create/begin", post(create::root_handler))
        .route("/create/begin/*path", post(create::handler))
        .route("/create/upload", post(upload::handler))
        .route("/create/commit", post(commit::handler))
        .route("/update", patch(update::root_handler))
        .route("/update/*path", patch(update::handler))
        .with_state(state)
}

/// Wildcard captures arrive without their leading slash.
fn content_path(captured: &str) -> String {
    format!("/{}", captured)
}

fn transaction_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TRANSACTION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Client-side URL for an endpoint addressed by content path. The root maps
/// to the bare endpoint since wildcard routes need at least one segment.
fn endpoint_url(base_url: &Url, endpoint: &str, path: &str) -> Result<Url, url::ParseError> {
    let path = path.trim_matches('/');
    if path.is_empty() {
        base_url.join(&format!("/api/v0/content/{}", endpoint))
    } else {
        base_url.join(&format!("/api/v0/content/{}/{}", endpoint, path))
    }
}
