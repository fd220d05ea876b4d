//! Shared fixture for HTTP router tests
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use common::testkit::{blog_fixture, TEST_SECRET};
use quill_daemon::http_server::{self, Config};
use quill_daemon::{ServiceConfig, ServiceState};

pub struct TestServer {
    // held for its Drop
    _dir: TempDir,
    content: PathBuf,
    pub state: ServiceState,
    router: Router,
}

/// A router over the blog fixture with a static directory holding
/// `site.css`.
pub async fn setup() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let content = dir.path().join("content");
    for (relative, contents) in blog_fixture() {
        let path = content.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }
    let static_dir = dir.path().join("static");
    std::fs::create_dir_all(&static_dir).unwrap();
    std::fs::write(static_dir.join("site.css"), "body {}").unwrap();

    let config = ServiceConfig {
        port: 8012,
        public_url: None,
        content_root: content.clone(),
        root_type: common::types::builtin::WEBSITE.to_string(),
        types_file: None,
        static_dir: Some(static_dir),
        render_dir: Some(dir.path().join("render")),
        secret: TEST_SECRET.to_vec(),
        log_level: tracing::Level::DEBUG,
        log_dir: None,
    };
    let state = ServiceState::from_config(&config).await.unwrap();
    let http_config = Config::new(SocketAddr::from(([127, 0, 0, 1], 8012))).unwrap();
    let router = http_server::router(http_config, state.clone());

    TestServer {
        _dir: dir,
        content,
        state,
        router,
    }
}

impl TestServer {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn content(&self) -> &Path {
        &self.content
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.content.join(relative)).unwrap()
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.content.join(relative).exists()
    }

    /// Send a request and return the status plus the raw body.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    /// Send a request and parse the body as JSON.
    pub async fn json(&self, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = self.send(request).await;
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn commit(token: &str) -> Request<Body> {
    Request::post("/api/v0/content/create/commit")
        .header("x-transaction", token)
        .body(Body::empty())
        .unwrap()
}

pub const BOUNDARY: &str = "quill-test-boundary";

/// A multipart upload with one file part per `(file_name, contents)`.
pub fn upload(token: Option<&str>, files: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, contents) in files {
        body.push_str(&format!(
            "--{}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n{}\r\n",
            BOUNDARY, name, contents
        ));
    }
    body.push_str(&format!("--{}--\r\n", BOUNDARY));

    let mut builder = Request::post("/api/v0/content/create/upload").header(
        "content-type",
        format!("multipart/form-data; boundary={}", BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header("x-transaction", token);
    }
    builder.body(Body::from(body)).unwrap()
}
