//! Integration tests for property updates

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ::common::edit::EditError;
use ::common::loader::ContentLoader;
use ::common::path::ContentPath;
use serde_json::json;

use common::{object, setup_site, POST_DIR};

#[tokio::test]
async fn test_unknown_key_is_unsaved() {
    let site = setup_site().await;

    let updates = object(&[("title", json!("New Title")), ("bogus", json!(1))]);
    let response = site
        .handler()
        .update_path("/blog/post-1", updates)
        .await
        .unwrap();

    assert_eq!(response.unsaved, vec!["bogus".to_string()]);
    assert!(response.errors.contains_key("bogus"));

    let index = site.read(&format!("{}/_index.yml", POST_DIR)).unwrap();
    assert!(index.contains("New Title"));
    assert!(!index.contains("bogus"));
    // untouched keys survive
    assert!(index.contains("author: Ada"));
}

#[tokio::test]
async fn test_map_failure_does_not_block_other_keys() {
    let site = setup_site().await;

    let updates = object(&[
        ("attributes", json!({"a": "b"})),
        ("draft", json!(true)),
    ]);
    let response = site
        .handler()
        .update_path("/blog/post-1", updates)
        .await
        .unwrap();

    assert_eq!(response.unsaved, vec!["attributes".to_string()]);
    let index = site.read(&format!("{}/_index.yml", POST_DIR)).unwrap();
    assert!(index.contains("draft: true"));
    assert!(!index.contains("attributes"));
}

#[tokio::test]
async fn test_parsable_update_writes_sidecar() {
    let site = setup_site().await;

    let updates = object(&[("body", json!("# Rewritten\n"))]);
    let response = site
        .handler()
        .update_path("/blog/post-1", updates)
        .await
        .unwrap();
    assert!(response.unsaved.is_empty());

    assert_eq!(
        site.read(&format!("{}/@body.md", POST_DIR)).unwrap(),
        "# Rewritten\n"
    );
    let body = site
        .loader()
        .tree()
        .node(&ContentPath::parse("/blog/post-1/@body").unwrap())
        .cloned()
        .unwrap();
    assert_eq!(body.raw_content.as_deref(), Some("# Rewritten\n"));
}

#[tokio::test]
async fn test_ambiguous_parsable_is_unsaved() {
    let site = setup_site().await;

    let updates = object(&[("summary", json!("short"))]);
    let response = site
        .handler()
        .update_path("/blog/post-1", updates)
        .await
        .unwrap();
    assert_eq!(response.unsaved, vec!["summary".to_string()]);
    assert!(!site.exists(&format!("{}/@summary.md", POST_DIR)));
}

#[tokio::test]
async fn test_update_reloads_and_notifies() {
    let site = setup_site().await;
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let _subscription = site.bus().subscribe(move |event| {
        assert_eq!(event.path.to_string(), "/blog/post-1");
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });

    site.handler()
        .update_path("/blog/post-1", object(&[("author", json!("Grace"))]))
        .await
        .unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    let node = site
        .loader()
        .tree()
        .node(&ContentPath::parse("/blog/post-1").unwrap())
        .cloned()
        .unwrap();
    assert_eq!(node.data["author"].as_str(), Some("Grace"));
}

#[tokio::test]
async fn test_update_missing_index_creates_it() {
    let site = setup_site().await;
    std::fs::remove_file(site.path("001.notes.folder/_index.yml")).unwrap();

    site.handler()
        .update_path("/notes", object(&[("title", json!("Notes"))]))
        .await
        .unwrap();
    assert!(site.read("001.notes.folder/_index.yml").unwrap().contains("Notes"));
}

#[tokio::test]
async fn test_update_unknown_path() {
    let site = setup_site().await;
    let result = site
        .handler()
        .update_path("/nope", object(&[("title", json!("x"))]))
        .await;
    assert!(matches!(result, Err(EditError::NotFound(_))));

    let result = site
        .handler()
        .update_path("/../etc", object(&[]))
        .await;
    assert!(matches!(result, Err(EditError::NotFound(_))));
}

#[tokio::test]
async fn test_update_property_node_is_rejected() {
    let site = setup_site().await;
    let result = site
        .handler()
        .update_path("/blog/post-1/@body", object(&[("title", json!("x"))]))
        .await;
    assert!(matches!(result, Err(EditError::Validation(_))));
}

#[tokio::test]
async fn test_null_clears_optional_field() {
    let site = setup_site().await;

    let response = site
        .handler()
        .update_path("/blog/post-1", object(&[("author", json!(null))]))
        .await
        .unwrap();
    assert!(response.unsaved.is_empty());

    let index = site.read(&format!("{}/_index.yml", POST_DIR)).unwrap();
    assert!(!index.contains("author"));
    assert!(index.contains("Post One"));
    let node = site
        .loader()
        .tree()
        .node(&ContentPath::parse("/blog/post-1").unwrap())
        .cloned()
        .unwrap();
    assert!(node.data.get("author").is_none());
}

#[cfg(unix)]
#[tokio::test]
async fn test_update_keeps_index_mode() {
    use std::os::unix::fs::PermissionsExt;

    let site = setup_site().await;
    let index = site.path(&format!("{}/_index.yml", POST_DIR));
    std::fs::set_permissions(&index, std::fs::Permissions::from_mode(0o644)).unwrap();

    site.handler()
        .update_path("/blog/post-1", object(&[("title", json!("Renamed"))]))
        .await
        .unwrap();

    let mode = std::fs::metadata(&index).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o644);
}
