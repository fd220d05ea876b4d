//! Shared test utilities for content editing integration tests
#![allow(dead_code)]

use common::edit::ContentCreate;
use common::testkit::TestSite;
use serde_json::{Map, Value};

pub const POST_DIR: &str = "000.blog.folder/000.post-1.article";

/// Set up the blog fixture.
pub async fn setup_site() -> TestSite {
    TestSite::blog().await.unwrap()
}

/// Build a JSON object from key/value pairs.
pub fn object(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// A create request for an article in the `children` collection.
pub fn article(slug: &str, title: &str) -> ContentCreate {
    ContentCreate {
        property: "children".to_string(),
        type_identifier: "article".to_string(),
        slug: slug.to_string(),
        content: object(&[("title", Value::String(title.to_string()))]),
    }
}
