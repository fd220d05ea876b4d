use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;

use common::version::{build_info, BuildInfo};

mod readiness;

use crate::ServiceState;

pub use readiness::{ContentReadiness, NotReady, Readiness, ReadyReport};

pub fn router(state: ServiceState) -> Router<ServiceState> {
    Router::new()
        .route("/livez", get(livez))
        .route("/readyz", get(readiness::handler))
        .route("/version", get(version))
        .with_state(state)
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Failure,
}

/// Body shared by the liveness and readiness checks.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nodes: Option<usize>,
}

impl HealthBody {
    pub fn ok() -> Self {
        Self {
            status: HealthStatus::Ok,
            message: None,
            nodes: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Failure,
            message: Some(message.into()),
            nodes: None,
        }
    }

    pub fn respond(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

#[tracing::instrument]
async fn livez() -> Response {
    HealthBody::ok().respond(StatusCode::OK)
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub service: &'static str,
    #[serde(flatten)]
    pub build: BuildInfo,
}

#[tracing::instrument]
async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        service: crate::state::APP_NAME,
        build: build_info(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_livez_always_ok() {
        let response = livez().await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_health_body_shape() {
        let body = serde_json::to_value(HealthBody::failure("gone")).unwrap();
        assert_eq!(body, serde_json::json!({"status": "failure", "message": "gone"}));
        let body = serde_json::to_value(HealthBody::ok()).unwrap();
        assert_eq!(body, serde_json::json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn test_version_names_service() {
        let Json(body) = version().await;
        let body = serde_json::to_value(body).unwrap();
        assert_eq!(body["service"], "quill");
        assert!(body["version"].is_string());
    }
}
