//! Content API routes: status codes and bodies over the blog fixture

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{commit, get, json_request, setup, upload};

const POST_INDEX: &str = "000.blog.folder/000.post-1.article/_index.yml";

#[tokio::test]
async fn test_reflect_routes() {
    let server = setup().await;

    let (status, body) = server.json(get("/api/v0/content/reflect/blog/post-1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["author"], "Ada");
    assert_eq!(body["reflection"]["type_name"], "website.Article");
    assert_eq!(body["breadcrumbs"][0]["path"], "/");

    let (status, body) = server.json(get("/api/v0/content/reflect")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["name"], "Test Site");

    let (status, body) = server.json(get("/api/v0/content/reflect/blog/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_types_route() {
    let server = setup().await;

    let (status, body) = server
        .json(get(
            "/api/v0/content/types?type=website.Article&type=website.Page",
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["types"]["website.Article"]["properties"].is_array());
    assert!(body["types"]["website.Page"].is_object());

    let (status, body) = server
        .json(get("/api/v0/content/types?type=std.String"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("std.String"));

    let (status, _) = server.json(get("/api/v0/content/types")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_reports_unsaved_keys() {
    let server = setup().await;

    let (status, body) = server
        .json(json_request(
            "PATCH",
            "/api/v0/content/update/blog/post-1",
            json!({"updates": {"author": "Grace", "bogus": 1}}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["unsaved"], json!(["bogus"]));
    assert!(body["errors"]["bogus"].is_string());

    let saved = server.read(POST_INDEX);
    assert!(saved.contains("Grace"));
    assert!(!saved.contains("bogus"));
}

#[tokio::test]
async fn test_update_missing_node() {
    let server = setup().await;
    let (status, _) = server
        .json(json_request(
            "PATCH",
            "/api/v0/content/update/nowhere",
            json!({"updates": {"title": "x"}}),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_flow() {
    let server = setup().await;

    let (status, begun) = server
        .json(json_request(
            "POST",
            "/api/v0/content/create/begin/notes",
            json!({
                "property": "children",
                "type_identifier": "article",
                "slug": "pics",
                "content": {"title": "Pics"}
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(begun["path"], "/notes/pics");
    let token = begun["transaction"].as_str().unwrap().to_string();

    // not visible before commit
    let (status, _) = server.json(get("/api/v0/content/reflect/notes/pics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, uploaded) = server
        .json(upload(Some(&token), &[("../../evil.txt", "bad bytes")]))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["files"][0]["file_name"], "evil.txt");
    assert_eq!(uploaded["files"][0]["size"], 9);
    assert!(server.exists("001.notes.folder/000.pics.article/evil.txt"));
    assert!(!server.content().parent().unwrap().join("evil.txt").exists());

    let (status, committed) = server.json(commit(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(committed["path"], "/notes/pics");

    let (status, body) = server.json(get("/api/v0/content/reflect/notes/pics")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["title"], "Pics");
}

#[tokio::test]
async fn test_begin_errors() {
    let server = setup().await;
    let begin = |path: &str, slug: &str| {
        json_request(
            "POST",
            &format!("/api/v0/content/create/begin{}", path),
            json!({"property": "children", "type_identifier": "article", "slug": slug}),
        )
    };

    let (status, _) = server.json(begin("/blog", "post-1")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = server.json(begin("/blog", "bad.slug")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server.json(begin("/missing", "fine")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // the bare route begins under the root
    let (status, _) = server.json(begin("", "fine")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(server.exists("002.fine.article"));
}

#[tokio::test]
async fn test_transaction_header_required() {
    let server = setup().await;

    let (status, body) = server.json(upload(None, &[("a.txt", "a")])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("x-transaction"));

    let request = axum::http::Request::post("/api/v0/content/create/commit")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = server.json(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tampered_tokens_forbidden() {
    let server = setup().await;

    let (status, _) = server.json(commit("bm90IGEgdG9rZW4=")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = server
        .json(upload(Some("bm90IGEgdG9rZW4="), &[("a.txt", "a")]))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!server.exists("a.txt"));
}
