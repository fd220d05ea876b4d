//! Schema reflection for content types.
//!
//! A [`ContentReflection`] tells clients (and the property store) how each
//! property of a type is materialized on disk.

mod property;
mod reflector;

pub use property::{
    AssetKind, ContentReflection, PrimitiveType, PropertyKind, PropertyReflection,
};
pub use reflector::{ReflectError, TypeReflector};
