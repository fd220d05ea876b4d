use axum::http::StatusCode;
use axum::response::Response;

use common::edit::EditError;

pub(super) use crate::http_server::handlers::error_body;

/// Map a handler failure onto a status. Server faults keep their detail in
/// the log and answer with a generic message.
pub(super) fn edit_error_response(operation: &str, err: EditError) -> Response {
    let status = match &err {
        EditError::NotFound(_) => StatusCode::NOT_FOUND,
        EditError::Validation(_) => StatusCode::BAD_REQUEST,
        EditError::AlreadyExists(_) => StatusCode::CONFLICT,
        EditError::TamperedToken => StatusCode::FORBIDDEN,
        EditError::Io(_) | EditError::Document(_) | EditError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if err.is_server_fault() {
        tracing::error!(operation, error = ?err, "content operation failed");
        return error_body(status, "internal server error");
    }
    tracing::debug!(operation, error = %err, "content operation rejected");
    error_body(status, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (EditError::NotFound("/x".into()), StatusCode::NOT_FOUND),
            (EditError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (EditError::AlreadyExists("/x".into()), StatusCode::CONFLICT),
            (EditError::TamperedToken, StatusCode::FORBIDDEN),
            (
                EditError::Internal("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                EditError::Io(std::io::Error::other("disk")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(edit_error_response("test", err).status(), status);
        }
    }
}
