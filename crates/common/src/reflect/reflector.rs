use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::types::{PropertyDescriptor, TypeRegistry, ValueType};

use super::property::{AssetKind, ContentReflection, PrimitiveType, PropertyKind, PropertyReflection};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReflectError {
    #[error("unknown content type: {0}")]
    UnknownType(String),
    #[error("property {property} of {type_name} refers to unknown type {base}")]
    UnknownBaseType {
        type_name: String,
        property: String,
        base: String,
    },
    #[error("property {property} of {type_name} is lazy but not transient")]
    LazyProperty { type_name: String, property: String },
    #[error("property {property} of {type_name} is a multi-valued parsable, which is unsupported")]
    MultiValueParsable { type_name: String, property: String },
}

/// Turns registered content types into [`ContentReflection`] schemas.
///
/// Results are cached per type name for the lifetime of the process; types
/// never change after startup.
#[derive(Debug)]
pub struct TypeReflector {
    registry: Arc<TypeRegistry>,
    cache: DashMap<String, Arc<ContentReflection>>,
}

impl TypeReflector {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn reflect(&self, type_name: &str) -> Result<Arc<ContentReflection>, ReflectError> {
        if let Some(cached) = self.cache.get(type_name) {
            return Ok(cached.clone());
        }

        // Computed outside the map lock; racing callers converge on whichever
        // result lands first.
        let reflection = Arc::new(self.compute(type_name)?);
        let entry = self
            .cache
            .entry(type_name.to_string())
            .or_insert(reflection);
        Ok(entry.value().clone())
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn compute(&self, type_name: &str) -> Result<ContentReflection, ReflectError> {
        let descriptor = self
            .registry
            .get(type_name)
            .ok_or_else(|| ReflectError::UnknownType(type_name.to_string()))?;

        let mut properties = Vec::new();
        for property in self.registry.properties(type_name) {
            if property.transient {
                continue;
            }
            if property.lazy {
                return Err(ReflectError::LazyProperty {
                    type_name: type_name.to_string(),
                    property: property.name,
                });
            }
            properties.push(self.reflect_property(type_name, property)?);
        }

        properties.sort_by(|a, b| (a.optional, &a.name).cmp(&(b.optional, &b.name)));

        tracing::debug!(
            type_name,
            properties = properties.len(),
            "reflected content type"
        );

        Ok(ContentReflection {
            type_name: descriptor.name.clone(),
            identifier: descriptor.identifier.clone(),
            properties,
        })
    }

    fn reflect_property(
        &self,
        type_name: &str,
        property: PropertyDescriptor,
    ) -> Result<PropertyReflection, ReflectError> {
        let kind = match &property.value {
            ValueType::Content { base, allowed } => {
                if self.registry.get(base).is_none() {
                    return Err(ReflectError::UnknownBaseType {
                        type_name: type_name.to_string(),
                        property: property.name,
                        base: base.clone(),
                    });
                }

                let parsable_types = self.parsable_types(base);
                if !parsable_types.is_empty() {
                    if property.multi_value {
                        return Err(ReflectError::MultiValueParsable {
                            type_name: type_name.to_string(),
                            property: property.name,
                        });
                    }
                    PropertyKind::Parsable { parsable_types }
                } else {
                    PropertyKind::Nested {
                        allowed_types: self.registry.allowed_for_slot(base, allowed),
                        base_type: base.clone(),
                    }
                }
            }
            ValueType::Map { value } => PropertyKind::Map {
                value_type: value.clone(),
            },
            ValueType::File => PropertyKind::FileAsset {
                asset: AssetKind::File,
            },
            ValueType::Image => PropertyKind::FileAsset {
                asset: AssetKind::Image,
            },
            ValueType::Reference => PropertyKind::ContentReference,
            ValueType::Enum { values } => PropertyKind::Enum {
                values: values.clone(),
            },
            ValueType::Boolean => PropertyKind::Primitive {
                primitive_type: PrimitiveType::Boolean,
            },
            ValueType::String => PropertyKind::Primitive {
                primitive_type: PrimitiveType::String,
            },
            ValueType::DateTime => PropertyKind::Primitive {
                primitive_type: PrimitiveType::ZonedDateTime,
            },
            ValueType::Scalar { name } => {
                tracing::warn!(
                    type_name,
                    property = %property.name,
                    scalar = %name,
                    "unrecognized scalar type, reflecting as unknown"
                );
                PropertyKind::Primitive {
                    primitive_type: PrimitiveType::Unknown,
                }
            }
        };

        Ok(PropertyReflection {
            name: property.name,
            optional: property.optional,
            multi_value: property.multi_value,
            kind,
        })
    }

    /// Extension -> type name for every parsable type usable as `base`.
    fn parsable_types(&self, base: &str) -> BTreeMap<String, String> {
        let mut parsable = BTreeMap::new();
        let candidates = self
            .registry
            .get(base)
            .into_iter()
            .chain(self.registry.concrete_subtypes(base));
        for descriptor in candidates {
            for extension in &descriptor.parsable {
                parsable
                    .entry(extension.clone())
                    .or_insert_with(|| descriptor.name.clone());
            }
        }
        parsable
    }
}
