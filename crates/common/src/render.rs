//! The contract between the server and a page renderer.

use std::sync::Arc;

use url::Url;

use crate::loader::{ContentMetadata, ContentNode, ContentTree};
use crate::path::ContentPath;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no renderer for content type {0}")]
    Unsupported(String),
    #[error("template error: {0}")]
    Template(String),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputType {
    #[default]
    Html,
    Json,
}

/// How rendered pages address each other and static assets.
#[derive(Debug, Clone)]
pub struct UrlConfig {
    pub base: Url,
    /// Prefix under which rendered pages are served, e.g. `/render`.
    pub path_prefix: String,
    pub static_files_prefix: String,
}

impl UrlConfig {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            path_prefix: "/render".to_string(),
            static_files_prefix: "/static".to_string(),
        }
    }

    fn join(&self, prefix: &str, rest: &str) -> Result<Url, RenderError> {
        let prefix = prefix.trim_end_matches('/');
        let rest = rest.trim_start_matches('/');
        Ok(self.base.join(&format!("{}/{}", prefix, rest))?)
    }

    pub fn page_url(&self, path: &ContentPath) -> Result<Url, RenderError> {
        self.join(&self.path_prefix, &path.to_string())
    }

    pub fn static_url(&self, file: &str) -> Result<Url, RenderError> {
        self.join(&self.static_files_prefix, file)
    }
}

pub struct RenderRequest {
    pub node: Arc<ContentNode>,
    pub metadata: Arc<ContentMetadata>,
    pub tree: Arc<ContentTree>,
    pub output: OutputType,
    pub url_config: UrlConfig,
}

pub trait Renderer: Send + Sync {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError>;
}

/// Insert a script that reloads the page whenever `events_url` emits a
/// `reload` event. Goes before the first `</head>`, or at the end.
pub fn inject_live_reload(html: &str, events_url: &str) -> String {
    let script = format!(
        "<script>(function(){{var s=new EventSource({:?});\
         s.addEventListener('reload',function(){{window.location.reload();}});}})();</script>",
        events_url
    );
    match html.find("</head>") {
        Some(index) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..index]);
            out.push_str(&script);
            out.push_str(&html[index..]);
            out
        }
        None => format!("{}{}", html, script),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inject_before_head_close() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = inject_live_reload(html, "/api/v0/events");
        let script = out.find("<script>").unwrap();
        assert!(script < out.find("</head>").unwrap());
        assert!(out.contains("\"/api/v0/events\""));
        assert_eq!(out.matches("</head>").count(), 1);
    }

    #[test]
    fn test_inject_appends_without_head() {
        let out = inject_live_reload("<p>hi</p>", "/events");
        assert!(out.starts_with("<p>hi</p><script>"));
    }

    #[test]
    fn test_urls() {
        let config = UrlConfig::new(Url::parse("http://localhost:8012").unwrap());
        assert_eq!(
            config
                .page_url(&ContentPath::parse("/blog/post").unwrap())
                .unwrap()
                .as_str(),
            "http://localhost:8012/render/blog/post"
        );
        assert_eq!(
            config.page_url(&ContentPath::root()).unwrap().as_str(),
            "http://localhost:8012/render/"
        );
        assert_eq!(
            config.static_url("/css/site.css").unwrap().as_str(),
            "http://localhost:8012/static/css/site.css"
        );
    }
}
