use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::edit::EditError;
use common::path::ContentPath;

use super::error::{edit_error_response, error_body};
use super::{transaction_token, TRANSACTION_HEADER};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone)]
pub struct CommitRequest {
    pub transaction: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResponse {
    pub status: String,
    pub path: ContentPath,
}

pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, CommitError> {
    let token = transaction_token(&headers).ok_or(CommitError::MissingTransaction)?;
    let committed = state.handler().create_child_commit(token).await?;
    tracing::info!(path = %committed.path, "child committed");

    Ok(Json(CommitResponse {
        status: "ok".to_string(),
        path: committed.path,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error("missing {} header", TRANSACTION_HEADER)]
    MissingTransaction,
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for CommitError {
    fn into_response(self) -> Response {
        match self {
            CommitError::MissingTransaction => error_body(StatusCode::BAD_REQUEST, self.to_string()),
            CommitError::Edit(e) => edit_error_response("create commit", e),
        }
    }
}

impl ApiRequest for CommitRequest {
    type Response = CommitResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/content/create/commit")?;
        Ok(client
            .post(full_url)
            .header(TRANSACTION_HEADER, self.transaction))
    }
}
