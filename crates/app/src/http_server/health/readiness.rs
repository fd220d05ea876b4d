use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::response::Response;
use http::request::Parts;
use http::StatusCode;

use common::loader::ContentLoader;

use super::HealthBody;
use crate::ServiceState;

const READINESS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadyReport {
    /// Nodes in the current tree snapshot
    pub nodes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum NotReady {
    #[error("content root is not available: {0}")]
    ContentRootMissing(PathBuf),
    #[error("service is shutting down")]
    ShuttingDown,
}

#[async_trait]
pub trait Readiness: Send + Sync {
    async fn check(&self) -> Result<ReadyReport, NotReady>;
}

/// Ready while the loader is open and the content root is still a directory.
pub struct ContentReadiness {
    loader: Arc<dyn ContentLoader>,
    content_root: PathBuf,
}

impl ContentReadiness {
    pub fn new(loader: Arc<dyn ContentLoader>, content_root: PathBuf) -> Self {
        Self {
            loader,
            content_root,
        }
    }
}

#[async_trait]
impl Readiness for ContentReadiness {
    async fn check(&self) -> Result<ReadyReport, NotReady> {
        if self.loader.is_closed() {
            return Err(NotReady::ShuttingDown);
        }
        match tokio::fs::metadata(&self.content_root).await {
            Ok(meta) if meta.is_dir() => Ok(ReadyReport {
                nodes: self.loader.tree().len(),
            }),
            _ => Err(NotReady::ContentRootMissing(self.content_root.clone())),
        }
    }
}

/// Extracts the readiness check for the running service.
pub struct ReadinessSource(Arc<dyn Readiness>);

#[async_trait]
impl FromRequestParts<ServiceState> for ReadinessSource {
    type Rejection = ();

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ServiceState,
    ) -> Result<Self, Self::Rejection> {
        let handler = state.handler();
        Ok(Self(Arc::new(ContentReadiness::new(
            handler.loader().clone(),
            handler.content_root().to_path_buf(),
        ))))
    }
}

pub async fn handler(ReadinessSource(source): ReadinessSource) -> Response {
    match tokio::time::timeout(READINESS_TIMEOUT, source.check()).await {
        Ok(Ok(report)) => HealthBody {
            nodes: Some(report.nodes),
            ..HealthBody::ok()
        }
        .respond(StatusCode::OK),
        Ok(Err(NotReady::ContentRootMissing(root))) => {
            tracing::warn!(root = %root.display(), "content root missing");
            HealthBody::failure("content root is not available")
                .respond(StatusCode::SERVICE_UNAVAILABLE)
        }
        Ok(Err(e @ NotReady::ShuttingDown)) => {
            HealthBody::failure(e.to_string()).respond(StatusCode::SERVICE_UNAVAILABLE)
        }
        Err(_) => HealthBody::failure("readiness check timed out")
            .respond(StatusCode::SERVICE_UNAVAILABLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Fixed {
        Ready(usize),
        Missing,
        Closing,
    }

    #[async_trait]
    impl Readiness for Fixed {
        async fn check(&self) -> Result<ReadyReport, NotReady> {
            match self {
                Fixed::Ready(nodes) => Ok(ReadyReport { nodes: *nodes }),
                Fixed::Missing => Err(NotReady::ContentRootMissing(PathBuf::from("/gone"))),
                Fixed::Closing => Err(NotReady::ShuttingDown),
            }
        }
    }

    async fn status_of(source: Fixed) -> (StatusCode, serde_json::Value) {
        let response = handler(ReadinessSource(Arc::new(source))).await;
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_ready_reports_node_count() {
        let (status, body) = status_of(Fixed::Ready(7)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["nodes"], 7);
    }

    #[tokio::test]
    async fn test_not_ready() {
        let (status, body) = status_of(Fixed::Missing).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "content root is not available");

        let (status, body) = status_of(Fixed::Closing).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], "service is shutting down");
    }
}
