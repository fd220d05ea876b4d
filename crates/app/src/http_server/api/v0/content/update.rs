use std::collections::BTreeMap;

use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::edit::EditError;

use super::error::edit_error_response;
use super::{content_path, endpoint_url};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateRequest {
    /// Target node; carried in the URL, not the body
    #[serde(skip)]
    pub path: String,
    pub updates: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateResponse {
    pub status: String,
    pub unsaved: Vec<String>,
    pub errors: BTreeMap<String, String>,
}

pub async fn root_handler(
    state: State<ServiceState>,
    Json(req): Json<UpdateRequest>,
) -> Result<impl IntoResponse, UpdateError> {
    update(state, "/", req).await
}

pub async fn handler(
    state: State<ServiceState>,
    Path(path): Path<String>,
    Json(req): Json<UpdateRequest>,
) -> Result<impl IntoResponse, UpdateError> {
    update(state, &content_path(&path), req).await
}

async fn update(
    State(state): State<ServiceState>,
    path: &str,
    req: UpdateRequest,
) -> Result<Json<UpdateResponse>, UpdateError> {
    let keys = req.updates.len();
    let result = state.handler().update_path(path, req.updates).await?;
    tracing::info!(
        path,
        keys,
        saved = keys.saturating_sub(result.unsaved.len()),
        "content updated"
    );

    Ok(Json(UpdateResponse {
        status: "ok".to_string(),
        unsaved: result.unsaved,
        errors: result.errors,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for UpdateError {
    fn into_response(self) -> Response {
        match self {
            UpdateError::Edit(e) => edit_error_response("update", e),
        }
    }
}

impl ApiRequest for UpdateRequest {
    type Response = UpdateResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = endpoint_url(base_url, "update", &self.path)?;
        Ok(client.patch(full_url).json(&self))
    }
}
