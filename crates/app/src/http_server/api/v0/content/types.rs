use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{RawQuery, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::edit::EditError;
use common::reflect::ContentReflection;

use super::error::{edit_error_response, error_body};
use crate::http_server::api::client::ApiRequest;
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize, clap::Args)]
pub struct TypesRequest {
    /// Fully-qualified content type names, e.g. website.Article
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypesResponse {
    pub types: BTreeMap<String, Arc<ContentReflection>>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    RawQuery(query): RawQuery,
) -> Result<impl IntoResponse, TypesError> {
    let names: Vec<String> = url::form_urlencoded::parse(query.unwrap_or_default().as_bytes())
        .filter(|(key, _)| key == "type")
        .map(|(_, value)| value.into_owned())
        .collect();
    if names.is_empty() {
        return Err(TypesError::NoTypes);
    }

    let types = state.handler().list_types(&names)?;
    Ok(Json(TypesResponse { types }))
}

#[derive(Debug, thiserror::Error)]
pub enum TypesError {
    #[error("at least one type parameter is required")]
    NoTypes,
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for TypesError {
    fn into_response(self) -> Response {
        match self {
            TypesError::NoTypes => {
                error_body(http::StatusCode::BAD_REQUEST, self.to_string())
            }
            TypesError::Edit(e) => edit_error_response("list types", e),
        }
    }
}

impl ApiRequest for TypesRequest {
    type Response = TypesResponse;

    fn build_request(
        self,
        base_url: &Url,
        client: &Client,
    ) -> Result<RequestBuilder, url::ParseError> {
        let full_url = base_url.join("/api/v0/content/types")?;
        let query: Vec<(&str, String)> = self.names.into_iter().map(|n| ("type", n)).collect();
        Ok(client.get(full_url).query(&query))
    }
}
