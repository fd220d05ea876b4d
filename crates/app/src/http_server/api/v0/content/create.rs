use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::edit::{ContentCreate, EditError};
use common::path::ContentPath;

use super::error::edit_error_response;
use super::{content_path, endpoint_url};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

/// Client side of `create/begin`: the parent path goes into the URL, the
/// creation details into the body.
#[derive(Debug, Clone)]
pub struct BeginRequest {
    pub parent: String,
    pub create: ContentCreate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginResponse {
    pub status: String,
    pub transaction: String,
    pub path: ContentPath,
}

pub async fn root_handler(
    state: State<ServiceState>,
    Json(req): Json<ContentCreate>,
) -> Result<impl IntoResponse, BeginError> {
    begin(state, "/", req).await
}

pub async fn handler(
    state: State<ServiceState>,
    Path(path): Path<String>,
    Json(req): Json<ContentCreate>,
) -> Result<impl IntoResponse, BeginError> {
    begin(state, &content_path(&path), req).await
}

async fn begin(
    State(state): State<ServiceState>,
    parent: &str,
    req: ContentCreate,
) -> Result<Response, BeginError> {
    tracing::info!(
        parent,
        slug = %req.slug,
        type_identifier = %req.type_identifier,
        "begin child creation"
    );
    let begun = state.handler().create_child_begin(parent, req).await?;

    Ok((
        http::StatusCode::CREATED,
        Json(BeginResponse {
            status: "ok".to_string(),
            transaction: begun.transaction,
            path: begun.path,
        }),
    )
        .into_response())
}

#[derive(Debug, thiserror::Error)]
pub enum BeginError {
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for BeginError {
    fn into_response(self) -> Response {
        match self {
            BeginError::Edit(e) => edit_error_response("create begin", e),
        }
    }
}

impl ApiRequest for BeginRequest {
    type Response = BeginResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = endpoint_url(base_url, "create/begin", &self.parent)?;
        Ok(client.post(full_url).json(&self.create))
    }
}
