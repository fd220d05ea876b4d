use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

mod not_found;

pub use not_found::not_found_handler;

/// `{"status": "error", "message": ...}` with the given status.
pub(crate) fn error_body(status: StatusCode, message: impl Into<String>) -> Response {
    let body = serde_json::json!({"status": "error", "message": message.into()});
    (status, Json(body)).into_response()
}
