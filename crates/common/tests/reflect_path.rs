//! End-to-end reflection of loaded content

mod common;

use std::sync::Arc;

use ::common::edit::EditError;
use ::common::loader::ContentLoader;
use ::common::path::ContentPath;
use ::common::reflect::PropertyKind;
use ::common::types::builtin;

use common::setup_site;

#[tokio::test]
async fn test_reflect_post() {
    let site = setup_site().await;
    let response = site.handler().reflect_path("/blog/post-1").await.unwrap();

    assert_eq!(response.reflection.type_name, builtin::ARTICLE);
    let body = response.reflection.property("body").unwrap();
    assert!(matches!(body.kind, PropertyKind::Parsable { .. }));
    let author = response.reflection.property("author").unwrap();
    assert!(matches!(author.kind, PropertyKind::Primitive { .. }));

    assert_eq!(response.content["author"], "Ada");
    assert_eq!(response.content["title"], "Post One");

    let body_children = &response.children["body"];
    assert_eq!(body_children.len(), 1);
    assert!(body_children[0].is_property);
    assert_eq!(body_children[0].path.to_string(), "/blog/post-1/@body");
    assert_eq!(body_children[0].raw_content.as_deref(), Some("# Post One\n"));

    let crumbs: Vec<String> = response
        .breadcrumbs
        .iter()
        .map(|b| b.path.to_string())
        .collect();
    assert_eq!(crumbs, vec!["/", "/blog", "/blog/post-1"]);
    assert_eq!(response.breadcrumbs[2].name, "post-1");

    assert!(response.types.contains_key(builtin::SEO));
}

#[tokio::test]
async fn test_reflect_folder_children_and_types() {
    let site = setup_site().await;
    let response = site.handler().reflect_path("/blog").await.unwrap();

    let members = &response.children["children"];
    assert_eq!(members.len(), 1);
    assert!(!members[0].is_property);
    assert!(members[0].raw_content.is_none());

    for name in [builtin::PAGE, builtin::ARTICLE, builtin::FOLDER, builtin::SEO] {
        assert!(response.types.contains_key(name), "missing {}", name);
    }
}

#[tokio::test]
async fn test_reflect_root_and_missing_index() {
    let site = setup_site().await;
    let root = site.handler().reflect_path("/").await.unwrap();
    assert_eq!(root.breadcrumbs.len(), 1);
    assert_eq!(root.content["name"], "Test Site");

    std::fs::remove_file(site.path("001.notes.folder/_index.yml")).unwrap();
    let notes = site.handler().reflect_path("/notes").await.unwrap();
    assert_eq!(notes.content, serde_json::json!({}));
}

#[tokio::test]
async fn test_reflect_unknown_path() {
    let site = setup_site().await;
    assert!(matches!(
        site.handler().reflect_path("/blog/nope").await,
        Err(EditError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_resolve_keeps_its_snapshot() {
    let site = setup_site().await;
    let resolved = site.handler().resolve("/notes").unwrap();

    site.write("001.notes.folder/000.fresh.article/_index.yml", "title: Fresh\n")
        .unwrap();
    site.loader()
        .reload(&ContentPath::parse("/notes").unwrap())
        .await
        .unwrap();

    let fresh = ContentPath::parse("/notes/fresh").unwrap();
    assert!(site.loader().tree().node(&fresh).is_some());
    assert!(resolved.tree.node(&fresh).is_none());
    assert!(Arc::ptr_eq(
        resolved.tree.node(&resolved.node.path).unwrap(),
        &resolved.node
    ));
    assert!(Arc::ptr_eq(
        resolved.tree.metadata(&resolved.node.path).unwrap(),
        &resolved.metadata
    ));
}

#[tokio::test]
async fn test_list_types() {
    let site = setup_site().await;
    let types = site
        .handler()
        .list_types(&[builtin::ARTICLE.to_string(), builtin::PAGE.to_string()])
        .unwrap();
    assert_eq!(types.len(), 2);

    let result = site
        .handler()
        .list_types(&[builtin::ARTICLE.to_string(), "std.String".to_string()]);
    assert!(matches!(result, Err(EditError::Validation(ref m)) if m.contains("std.String")));
}
