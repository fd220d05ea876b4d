/// Lightweight harness for content editing tests
///
/// A [`TestSite`] lays out a content directory in a temp dir, loads it with
/// the built-in website types, and wires up a [`ContentHandler`] the same
/// way the server does.
///
/// # Example
///
/// ```rust,ignore
/// use common::testkit::TestSite;
///
/// #[tokio::test]
/// async fn test_update() -> anyhow::Result<()> {
///     let site = TestSite::blog().await?;
///
///     let mut updates = serde_json::Map::new();
///     updates.insert("title".into(), "Renamed".into());
///     site.handler().update_path("/blog/post-1", updates).await?;
///
///     assert!(site.read("000.blog.folder/000.post-1.article/_index.yml")?.contains("Renamed"));
///     Ok(())
/// }
/// ```
mod site;

pub use site::{blog_fixture, TestSite, TEST_SECRET};
