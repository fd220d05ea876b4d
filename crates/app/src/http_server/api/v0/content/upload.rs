use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use common::edit::{EditError, UploadedFile};

use super::error::{edit_error_response, error_body};
use super::{transaction_token, TRANSACTION_HEADER};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: String,
    pub files: Vec<UploadedFile>,
}

/// Stream every file part of the form into the pending child's directory.
/// Parts without a file name are skipped.
pub async fn handler(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, UploadError> {
    let token = transaction_token(&headers).ok_or(UploadError::MissingTransaction)?;
    let target = state.handler().create_child_upload(token)?;

    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::warn!("multipart parsing error: {}", e);
        UploadError::Multipart(e.to_string())
    })? {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            tracing::warn!(field = ?field.name(), "ignoring part without a file name");
            continue;
        };
        let stored = target.write_part(&file_name, field).await?;
        files.push(stored);
    }

    tracing::info!(
        path = %target.content_path(),
        files = files.len(),
        "upload complete"
    );
    Ok(Json(UploadResponse {
        status: "ok".to_string(),
        files,
    }))
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("missing {} header", TRANSACTION_HEADER)]
    MissingTransaction,
    #[error("invalid multipart body: {0}")]
    Multipart(String),
    #[error(transparent)]
    Edit(#[from] EditError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::MissingTransaction => error_body(StatusCode::BAD_REQUEST, self.to_string()),
            UploadError::Multipart(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            UploadError::Edit(e) => edit_error_response("create upload", e),
        }
    }
}
