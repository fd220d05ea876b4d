use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    String,
    ZonedDateTime,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    File,
    Image,
}

/// How a property materializes on disk and how it may be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    Primitive {
        primitive_type: PrimitiveType,
    },
    /// Inline in the index document or in a `@<name>.<ext>` sidecar.
    Parsable {
        /// Sidecar extension -> type name.
        parsable_types: BTreeMap<String, String>,
    },
    Nested {
        /// Identifier -> type name.
        allowed_types: BTreeMap<String, String>,
        base_type: String,
    },
    FileAsset {
        asset: AssetKind,
    },
    ContentReference,
    Map {
        value_type: String,
    },
    Enum {
        values: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyReflection {
    pub name: String,
    pub optional: bool,
    pub multi_value: bool,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

/// The reflected schema of one content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentReflection {
    pub type_name: String,
    pub identifier: String,
    /// Required properties first, then alphabetical.
    pub properties: Vec<PropertyReflection>,
}

impl ContentReflection {
    pub fn property(&self, name: &str) -> Option<&PropertyReflection> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Type names a client needs to build forms for the nested properties.
    pub fn nested_type_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for property in &self.properties {
            if let PropertyKind::Nested {
                allowed_types,
                base_type,
            } = &property.kind
            {
                names.extend(allowed_types.values().map(String::as_str));
                names.push(base_type.as_str());
            }
        }
        names.sort_unstable();
        names.dedup();
        names
    }
}
