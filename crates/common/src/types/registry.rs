use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

use super::descriptor::{ContentTypeDescriptor, PropertyDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate content type name: {0}")]
    DuplicateName(String),
    #[error("duplicate content type identifier: {0}")]
    DuplicateIdentifier(String),
    #[error("invalid identifier {identifier:?} for type {name}")]
    InvalidIdentifier { name: String, identifier: String },
    #[error("type {name} extends unknown type {base}")]
    UnknownBase { name: String, base: String },
    #[error("type {name} declares property {property} more than once")]
    DuplicateProperty { name: String, property: String },
    #[error("failed to read type set: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse type set: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Identifiers appear in directory names (`000.slug.identifier`), so they
/// may not contain dots or path separators.
pub fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"))
}

/// The set of content types known to the process.
///
/// Built once at startup and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, ContentTypeDescriptor>,
    by_identifier: BTreeMap<String, String>,
}

impl TypeRegistry {
    pub fn new(descriptors: Vec<ContentTypeDescriptor>) -> Result<Self, RegistryError> {
        let mut registry = Self::default();

        for descriptor in descriptors {
            if !identifier_pattern().is_match(&descriptor.identifier) {
                return Err(RegistryError::InvalidIdentifier {
                    name: descriptor.name,
                    identifier: descriptor.identifier,
                });
            }
            let mut seen = BTreeSet::new();
            for property in &descriptor.properties {
                if !seen.insert(property.name.as_str()) {
                    return Err(RegistryError::DuplicateProperty {
                        name: descriptor.name.clone(),
                        property: property.name.clone(),
                    });
                }
            }
            if registry.types.contains_key(&descriptor.name) {
                return Err(RegistryError::DuplicateName(descriptor.name));
            }
            if registry.by_identifier.contains_key(&descriptor.identifier) {
                return Err(RegistryError::DuplicateIdentifier(descriptor.identifier));
            }
            registry
                .by_identifier
                .insert(descriptor.identifier.clone(), descriptor.name.clone());
            registry.types.insert(descriptor.name.clone(), descriptor);
        }

        for descriptor in registry.types.values() {
            for base in &descriptor.extends {
                if !registry.types.contains_key(base) {
                    return Err(RegistryError::UnknownBase {
                        name: descriptor.name.clone(),
                        base: base.clone(),
                    });
                }
            }
        }

        tracing::debug!(types = registry.types.len(), "type registry built");
        Ok(registry)
    }

    /// Parse a YAML list of type descriptors.
    pub fn from_yaml(source: &str) -> Result<Self, RegistryError> {
        let descriptors: Vec<ContentTypeDescriptor> = serde_yaml::from_str(source)?;
        Self::new(descriptors)
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml(&source)
    }

    pub fn get(&self, name: &str) -> Option<&ContentTypeDescriptor> {
        self.types.get(name)
    }

    pub fn by_identifier(&self, identifier: &str) -> Option<&ContentTypeDescriptor> {
        self.by_identifier
            .get(identifier)
            .and_then(|name| self.types.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// The type itself followed by its transitive supertypes, breadth first.
    pub fn lineage(&self, name: &str) -> Vec<&ContentTypeDescriptor> {
        let mut lineage = Vec::new();
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([name]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(descriptor) = self.types.get(current) {
                queue.extend(descriptor.extends.iter().map(String::as_str));
                lineage.push(descriptor);
            }
        }
        lineage
    }

    /// Whether a value of type `name` may be stored where `base` is declared.
    pub fn is_assignable(&self, name: &str, base: &str) -> bool {
        self.lineage(name).iter().any(|d| d.name == base)
    }

    /// Declared properties including inherited ones. A subtype redeclaring
    /// a property replaces the inherited declaration in place.
    pub fn properties(&self, name: &str) -> Vec<PropertyDescriptor> {
        let mut properties: Vec<PropertyDescriptor> = Vec::new();
        for descriptor in self.lineage(name).into_iter().rev() {
            for property in &descriptor.properties {
                match properties.iter_mut().find(|p| p.name == property.name) {
                    Some(existing) => *existing = property.clone(),
                    None => properties.push(property.clone()),
                }
            }
        }
        properties
    }

    /// Concrete (non-abstract) types assignable to `base`.
    pub fn concrete_subtypes<'a>(
        &'a self,
        base: &'a str,
    ) -> impl Iterator<Item = &'a ContentTypeDescriptor> + 'a {
        self.types
            .values()
            .filter(move |d| !d.abstract_type && self.is_assignable(&d.name, base))
    }

    /// Identifier -> type name for everything legal in a slot of `base`,
    /// including explicitly allowed identifiers.
    pub fn allowed_for_slot(&self, base: &str, explicit: &[String]) -> BTreeMap<String, String> {
        let mut allowed: BTreeMap<String, String> = explicit
            .iter()
            .filter_map(|identifier| self.by_identifier(identifier))
            .map(|d| (d.identifier.clone(), d.name.clone()))
            .collect();
        allowed.extend(
            self.concrete_subtypes(base)
                .map(|d| (d.identifier.clone(), d.name.clone())),
        );
        allowed
    }
}
