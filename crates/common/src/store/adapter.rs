use serde_json::Value as Json;
use serde_yaml::Value as Yaml;

use crate::reflect::{PrimitiveType, PropertyKind, PropertyReflection};

use super::document::{write_atomic, IndexDocument};

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("writing {0} properties is not supported")]
    Unsupported(&'static str),
    #[error("multi-valued nested properties cannot be written directly")]
    MultiValueNested,
    #[error("no single sidecar format, candidates: {}", .0.join(", "))]
    AmbiguousParsable(Vec<String>),
    #[error("invalid value, expected {expected}")]
    InvalidValue { expected: &'static str },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WriteError {
    /// Io failures abort a mutation; everything else is reported per key.
    pub fn is_fatal(&self) -> bool {
        matches!(self, WriteError::Io(_))
    }
}

/// File name of the sidecar holding a parsable property.
pub fn sidecar_name(property: &str, extension: &str) -> String {
    format!("@{}.{}", property, extension)
}

/// Write one property value into `doc` (or next to it) according to how the
/// property is materialized.
///
/// Inline writes only touch the in-memory document; the caller flushes.
/// Sidecar writes hit the disk immediately.
pub async fn write_property(
    doc: &mut IndexDocument,
    property: &PropertyReflection,
    value: Json,
) -> Result<(), WriteError> {
    match &property.kind {
        PropertyKind::Parsable { parsable_types } => {
            let Json::String(text) = value else {
                return Err(WriteError::InvalidValue { expected: "string" });
            };
            if doc.contains(&property.name) {
                doc.set(&property.name, Yaml::String(text));
                return Ok(());
            }
            let mut extensions = parsable_types.keys();
            let extension = match (extensions.next(), extensions.next()) {
                (Some(extension), None) => extension,
                _ => {
                    return Err(WriteError::AmbiguousParsable(
                        parsable_types.keys().cloned().collect(),
                    ))
                }
            };
            let sidecar = doc.dir().join(sidecar_name(&property.name, extension));
            write_atomic(&sidecar, text.into_bytes()).await?;
            tracing::debug!(sidecar = %sidecar.display(), "wrote sidecar");
            Ok(())
        }
        PropertyKind::Primitive { primitive_type } => {
            if value.is_null() {
                if !property.optional {
                    return Err(WriteError::InvalidValue { expected: "a value" });
                }
                // null clears an optional field
                doc.remove(&property.name);
                return Ok(());
            }
            if property.multi_value {
                let Json::Array(items) = &value else {
                    return Err(WriteError::InvalidValue { expected: "array" });
                };
                for item in items {
                    check_primitive(*primitive_type, item)?;
                }
            } else {
                check_primitive(*primitive_type, &value)?;
            }
            set_inline(doc, &property.name, value)
        }
        PropertyKind::ContentReference | PropertyKind::FileAsset { .. } | PropertyKind::Enum { .. } => {
            set_inline(doc, &property.name, value)
        }
        PropertyKind::Nested { .. } => {
            if property.multi_value {
                return Err(WriteError::MultiValueNested);
            }
            if !value.is_object() {
                return Err(WriteError::InvalidValue { expected: "object" });
            }
            set_inline(doc, &property.name, value)
        }
        PropertyKind::Map { .. } => Err(WriteError::Unsupported("map")),
    }
}

fn check_primitive(primitive_type: PrimitiveType, value: &Json) -> Result<(), WriteError> {
    let ok = match primitive_type {
        PrimitiveType::Boolean => value.is_boolean(),
        PrimitiveType::String | PrimitiveType::ZonedDateTime => value.is_string(),
        PrimitiveType::Unknown => true,
    };
    if ok {
        Ok(())
    } else {
        Err(WriteError::InvalidValue {
            expected: match primitive_type {
                PrimitiveType::Boolean => "boolean",
                _ => "string",
            },
        })
    }
}

fn set_inline(doc: &mut IndexDocument, name: &str, value: Json) -> Result<(), WriteError> {
    let value = serde_yaml::to_value(value)
        .map_err(|_| WriteError::InvalidValue { expected: "yaml-representable value" })?;
    doc.set(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::reflect::AssetKind;

    fn prop(name: &str, kind: PropertyKind) -> PropertyReflection {
        PropertyReflection {
            name: name.to_string(),
            optional: true,
            multi_value: false,
            kind,
        }
    }

    fn parsable(extensions: &[&str]) -> PropertyKind {
        PropertyKind::Parsable {
            parsable_types: extensions
                .iter()
                .map(|e| (e.to_string(), format!("t.{}", e)))
                .collect(),
        }
    }

    fn doc_in(dir: &tempfile::TempDir) -> IndexDocument {
        IndexDocument::empty(dir.path().join("_index.yml"))
    }

    #[tokio::test]
    async fn test_parsable_goes_to_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        write_property(&mut doc, &prop("body", parsable(&["md"])), json!("# Hi"))
            .await
            .unwrap();
        assert!(!doc.is_dirty());
        let sidecar = std::fs::read_to_string(dir.path().join("@body.md")).unwrap();
        assert_eq!(sidecar, "# Hi");
    }

    #[tokio::test]
    async fn test_parsable_overwrites_existing_inline_field() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        doc.set("body", Yaml::String("old".into()));
        write_property(&mut doc, &prop("body", parsable(&["md", "html"])), json!("new"))
            .await
            .unwrap();
        assert_eq!(doc.get("body"), Some(&Yaml::String("new".into())));
        assert!(!dir.path().join("@body.md").exists());
    }

    #[tokio::test]
    async fn test_ambiguous_parsable() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let result =
            write_property(&mut doc, &prop("summary", parsable(&["md", "html"])), json!("x")).await;
        assert!(matches!(result, Err(WriteError::AmbiguousParsable(ref c)) if c.len() == 2));
    }

    #[tokio::test]
    async fn test_map_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let kind = PropertyKind::Map {
            value_type: "String".into(),
        };
        let result = write_property(&mut doc, &prop("attributes", kind), json!({"a": "b"})).await;
        let err = result.unwrap_err();
        assert!(matches!(err, WriteError::Unsupported("map")));
        assert!(!err.is_fatal());
        assert!(!doc.is_dirty());
    }

    #[tokio::test]
    async fn test_primitive_type_checked() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let kind = PropertyKind::Primitive {
            primitive_type: PrimitiveType::Boolean,
        };
        assert!(matches!(
            write_property(&mut doc, &prop("draft", kind.clone()), json!("yes")).await,
            Err(WriteError::InvalidValue { expected: "boolean" })
        ));
        write_property(&mut doc, &prop("draft", kind), json!(true))
            .await
            .unwrap();
        assert_eq!(doc.get("draft"), Some(&Yaml::Bool(true)));
    }

    #[tokio::test]
    async fn test_null_clears_optional_primitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        doc.set("author", Yaml::String("Ada".into()));
        doc.flush().await.unwrap();

        let kind = PropertyKind::Primitive {
            primitive_type: PrimitiveType::String,
        };
        write_property(&mut doc, &prop("author", kind.clone()), json!(null))
            .await
            .unwrap();
        assert!(!doc.contains("author"));
        assert!(doc.is_dirty());

        let mut title = prop("title", kind);
        title.optional = false;
        assert!(matches!(
            write_property(&mut doc, &title, json!(null)).await,
            Err(WriteError::InvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn test_multi_value_primitive_requires_array() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let mut tags = prop(
            "tags",
            PropertyKind::Primitive {
                primitive_type: PrimitiveType::String,
            },
        );
        tags.multi_value = true;
        assert!(write_property(&mut doc, &tags, json!("rust")).await.is_err());
        write_property(&mut doc, &tags, json!(["rust", "yaml"]))
            .await
            .unwrap();
        assert!(doc.get("tags").unwrap().is_sequence());
    }

    #[tokio::test]
    async fn test_nested_rules() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let kind = PropertyKind::Nested {
            allowed_types: BTreeMap::new(),
            base_type: "t.Seo".into(),
        };
        let mut seo = prop("seo", kind);
        assert!(matches!(
            write_property(&mut doc, &seo, json!("nope")).await,
            Err(WriteError::InvalidValue { expected: "object" })
        ));
        write_property(&mut doc, &seo, json!({"title": "T"}))
            .await
            .unwrap();
        assert!(doc.get("seo").unwrap().is_mapping());

        seo.multi_value = true;
        assert!(matches!(
            write_property(&mut doc, &seo, json!({})).await,
            Err(WriteError::MultiValueNested)
        ));
    }

    #[tokio::test]
    async fn test_verbatim_kinds_mark_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = doc_in(&dir);
        let teaser = prop(
            "teaser",
            PropertyKind::FileAsset {
                asset: AssetKind::Image,
            },
        );
        write_property(&mut doc, &teaser, json!("cover.png"))
            .await
            .unwrap();
        assert!(doc.is_dirty());
        assert_eq!(doc.get("teaser"), Some(&Yaml::String("cover.png".into())));
    }
}
