use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::edit::{EditError, ReflectPathResponse};

use super::error::edit_error_response;
use super::{content_path, endpoint_url};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct ReflectRequest {
    /// Content path to reflect
    #[arg(default_value = "/")]
    pub path: String,
}

pub async fn root_handler(state: State<ServiceState>) -> Result<impl IntoResponse, ReflectError> {
    reflect(state, "/").await
}

pub async fn handler(
    state: State<ServiceState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ReflectError> {
    reflect(state, &content_path(&path)).await
}

async fn reflect(
    State(state): State<ServiceState>,
    path: &str,
) -> Result<Json<ReflectPathResponse>, ReflectError> {
    let response = state.handler().reflect_path(path).await?;
    Ok(Json(response))
}

#[derive(Debug, thiserror::Error)]
pub enum ReflectError {
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for ReflectError {
    fn into_response(self) -> Response {
        match self {
            ReflectError::Edit(e) => edit_error_response("reflect", e),
        }
    }
}

impl ApiRequest for ReflectRequest {
    type Response = ReflectPathResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        Ok(client.get(endpoint_url(base_url, "reflect", &self.path)?))
    }
}
