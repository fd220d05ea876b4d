use serde::{Deserialize, Serialize};

/// The declared value type of a content property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueType {
    Boolean,
    String,
    DateTime,
    /// A scalar the reflector has no dedicated primitive for.
    Scalar {
        name: String,
    },
    /// One or more content nodes of `base` (or a subtype).
    Content {
        base: String,
        /// Identifiers that are legal in this slot in addition to the
        /// subtypes of `base`.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        allowed: Vec<String>,
    },
    Map {
        value: String,
    },
    File,
    Image,
    Reference,
    Enum {
        values: Vec<String>,
    },
}

impl ValueType {
    pub fn content(base: impl Into<String>) -> Self {
        ValueType::Content {
            base: base.into(),
            allowed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub value: ValueType,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub multi_value: bool,
    /// Runtime-only state, never persisted or reflected.
    #[serde(default)]
    pub transient: bool,
    /// Lazily computed; only legal together with `transient`.
    #[serde(default)]
    pub lazy: bool,
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>, value: ValueType) -> Self {
        Self {
            name: name.into(),
            value,
            optional: false,
            multi_value: false,
            transient: false,
            lazy: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn multi_value(mut self) -> Self {
        self.multi_value = true;
        self
    }

    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }
}

/// Static description of a content type, registered once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDescriptor {
    /// Fully-qualified name, e.g. `website.Article`.
    pub name: String,
    /// Short identifier used in directory names, e.g. `article`.
    pub identifier: String,
    #[serde(default)]
    pub extends: Vec<String>,
    /// Sidecar extensions this type can be parsed from. Non-empty means
    /// the type is materialized from raw text.
    #[serde(default)]
    pub parsable: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_type: bool,
    #[serde(default)]
    pub properties: Vec<PropertyDescriptor>,
}

impl ContentTypeDescriptor {
    pub fn new(name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: identifier.into(),
            extends: Vec::new(),
            parsable: Vec::new(),
            abstract_type: false,
            properties: Vec::new(),
        }
    }

    pub fn extends(mut self, base: impl Into<String>) -> Self {
        self.extends.push(base.into());
        self
    }

    pub fn parsable(mut self, extension: impl Into<String>) -> Self {
        self.parsable.push(extension.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.abstract_type = true;
        self
    }

    pub fn property(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    pub fn is_parsable(&self) -> bool {
        !self.parsable.is_empty()
    }
}
