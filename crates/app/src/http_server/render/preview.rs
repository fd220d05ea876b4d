use askama::Template;
use serde_yaml::Value;

use common::render::{OutputType, RenderError, RenderRequest, Renderer};

/// Path segment for breadcrumb navigation
#[derive(Debug, Clone)]
pub struct PathSegment {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub value: String,
}

/// Links to the children of one property
#[derive(Debug, Clone)]
pub struct ChildGroup {
    pub property: String,
    pub links: Vec<PathSegment>,
}

#[derive(Template)]
#[template(path = "preview.html")]
pub struct PreviewTemplate {
    pub title: String,
    pub type_name: String,
    pub path: String,
    pub breadcrumbs: Vec<PathSegment>,
    pub fields: Vec<Field>,
    pub raw_content: Option<String>,
    pub children: Vec<ChildGroup>,
}

/// Generic page renderer: every node as a table of its fields plus links
/// to its children. JSON output is the node's document.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewRenderer;

impl Renderer for PreviewRenderer {
    fn render(&self, request: &RenderRequest) -> Result<String, RenderError> {
        match request.output {
            OutputType::Json => serde_json::to_string_pretty(&request.node.data)
                .map_err(|e| RenderError::Template(e.to_string())),
            OutputType::Html => self.render_html(request),
        }
    }
}

impl PreviewRenderer {
    fn render_html(&self, request: &RenderRequest) -> Result<String, RenderError> {
        let node = &request.node;
        let urls = &request.url_config;

        let mut breadcrumbs = Vec::new();
        for ancestor in node.path.ancestry() {
            let name = if ancestor.is_root() {
                "/".to_string()
            } else {
                ancestor.name().to_string()
            };
            breadcrumbs.push(PathSegment {
                name,
                url: urls.page_url(&ancestor)?.to_string(),
            });
        }

        let mut children = Vec::new();
        for (property, refs) in &request.metadata.direct_children {
            let mut links = Vec::new();
            for child in refs {
                links.push(PathSegment {
                    name: child.path.name().to_string(),
                    url: urls.page_url(&child.path)?.to_string(),
                });
            }
            children.push(ChildGroup {
                property: property.clone(),
                links,
            });
        }

        let template = PreviewTemplate {
            title: title_of(&node.data).unwrap_or_else(|| node.path.to_string()),
            type_name: node.type_name.clone(),
            path: node.path.to_string(),
            breadcrumbs,
            fields: fields_of(&node.data),
            raw_content: node.raw_content.clone(),
            children,
        };
        template
            .render()
            .map_err(|e| RenderError::Template(e.to_string()))
    }
}

fn title_of(data: &Value) -> Option<String> {
    ["title", "name"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

fn fields_of(data: &Value) -> Vec<Field> {
    let Some(mapping) = data.as_mapping() else {
        return Vec::new();
    };
    mapping
        .iter()
        .map(|(key, value)| Field {
            name: display_value(key),
            value: display_value(value),
        })
        .collect()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use common::loader::ContentLoader;
    use common::path::ContentPath;
    use common::render::UrlConfig;
    use common::testkit::TestSite;
    use url::Url;

    async fn request_for(site: &TestSite, path: &str, output: OutputType) -> RenderRequest {
        let tree = site.loader().tree();
        let path = ContentPath::parse(path).unwrap();
        RenderRequest {
            node: tree.node(&path).unwrap().clone(),
            metadata: tree.metadata(&path).unwrap().clone(),
            tree: Arc::clone(&tree),
            output,
            url_config: UrlConfig::new(Url::parse("http://localhost:8012").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_html_has_fields_and_links() {
        let site = TestSite::blog().await.unwrap();
        let request = request_for(&site, "/blog", OutputType::Html).await;
        let html = PreviewRenderer.render(&request).unwrap();

        assert!(html.contains("<title>Blog</title>"));
        assert!(html.contains("<h2>children</h2>"));
        assert!(html.contains(">post-1</a>"));
        assert!(html.contains("</head>"));
    }

    #[tokio::test]
    async fn test_html_shows_raw_content() {
        let site = TestSite::blog().await.unwrap();
        let request = request_for(&site, "/blog/post-1/@body", OutputType::Html).await;
        let html = PreviewRenderer.render(&request).unwrap();
        assert!(html.contains("# Post One"));
    }

    #[tokio::test]
    async fn test_json_is_document() {
        let site = TestSite::blog().await.unwrap();
        let request = request_for(&site, "/blog/post-1", OutputType::Json).await;
        let json: serde_json::Value =
            serde_json::from_str(&PreviewRenderer.render(&request).unwrap()).unwrap();
        assert_eq!(json["author"], "Ada");
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Bool(true)), "true");
        assert_eq!(display_value(&Value::Null), "");
        let seq: Value = serde_yaml::from_str("[a, b]").unwrap();
        assert_eq!(display_value(&seq), "- a\n- b");
    }
}
