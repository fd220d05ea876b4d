//! The built-in website type set.
//!
//! Used when no type-set file is configured, and by the test fixtures.

use super::descriptor::{ContentTypeDescriptor, PropertyDescriptor, ValueType};
use super::registry::TypeRegistry;

pub const WEBSITE: &str = "website.Website";
pub const PAGE: &str = "website.Page";
pub const FOLDER: &str = "website.Folder";
pub const ARTICLE: &str = "website.Article";
pub const SEO: &str = "website.Seo";
pub const TEXT: &str = "website.Text";
pub const MARKDOWN: &str = "website.Markdown";
pub const HTML: &str = "website.Html";

pub fn website_types() -> Vec<ContentTypeDescriptor> {
    vec![
        ContentTypeDescriptor::new(WEBSITE, "website")
            .property(PropertyDescriptor::new("name", ValueType::String))
            .property(PropertyDescriptor::new("description", ValueType::String).optional())
            .property(
                PropertyDescriptor::new("children", ValueType::content(PAGE))
                    .multi_value()
                    .optional(),
            )
            .property(
                PropertyDescriptor::new(
                    "metadata",
                    ValueType::Map {
                        value: "String".to_string(),
                    },
                )
                .optional(),
            ),
        ContentTypeDescriptor::new(PAGE, "page")
            .abstract_type()
            .property(PropertyDescriptor::new("title", ValueType::String))
            .property(PropertyDescriptor::new("seo", ValueType::content(SEO)).optional())
            .property(
                PropertyDescriptor::new("rendered_url", ValueType::String)
                    .transient()
                    .lazy(),
            ),
        ContentTypeDescriptor::new(FOLDER, "folder")
            .extends(PAGE)
            .property(PropertyDescriptor::new("intro", ValueType::content(MARKDOWN)).optional())
            .property(
                PropertyDescriptor::new("children", ValueType::content(PAGE))
                    .multi_value()
                    .optional(),
            ),
        ContentTypeDescriptor::new(ARTICLE, "article")
            .extends(PAGE)
            .property(PropertyDescriptor::new("body", ValueType::content(MARKDOWN)))
            .property(PropertyDescriptor::new("summary", ValueType::content(TEXT)).optional())
            .property(PropertyDescriptor::new("author", ValueType::String).optional())
            .property(PropertyDescriptor::new("date", ValueType::DateTime).optional())
            .property(PropertyDescriptor::new("draft", ValueType::Boolean).optional())
            .property(
                PropertyDescriptor::new("tags", ValueType::String)
                    .multi_value()
                    .optional(),
            )
            .property(PropertyDescriptor::new("teaser", ValueType::Image).optional())
            .property(
                PropertyDescriptor::new("attachments", ValueType::File)
                    .multi_value()
                    .optional(),
            )
            .property(PropertyDescriptor::new("related", ValueType::Reference).optional())
            .property(
                PropertyDescriptor::new(
                    "layout",
                    ValueType::Enum {
                        values: vec!["default".to_string(), "wide".to_string()],
                    },
                )
                .optional(),
            )
            .property(
                PropertyDescriptor::new(
                    "reading_time",
                    ValueType::Scalar {
                        name: "Duration".to_string(),
                    },
                )
                .optional(),
            )
            .property(
                PropertyDescriptor::new(
                    "attributes",
                    ValueType::Map {
                        value: "String".to_string(),
                    },
                )
                .optional(),
            ),
        ContentTypeDescriptor::new(SEO, "seo")
            .property(PropertyDescriptor::new("title", ValueType::String).optional())
            .property(PropertyDescriptor::new("description", ValueType::String).optional())
            .property(PropertyDescriptor::new("noindex", ValueType::Boolean).optional()),
        ContentTypeDescriptor::new(TEXT, "text").abstract_type(),
        ContentTypeDescriptor::new(MARKDOWN, "markdown")
            .extends(TEXT)
            .parsable("md"),
        ContentTypeDescriptor::new(HTML, "html").extends(TEXT).parsable("html"),
    ]
}

pub fn website_registry() -> TypeRegistry {
    TypeRegistry::new(website_types()).expect("built-in website types are consistent")
}
