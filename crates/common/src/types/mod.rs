//! Static content type registry
//!
//! Content types describe their properties up front through
//! [`ContentTypeDescriptor`]s. The [`TypeRegistry`] answers lookup,
//! inheritance and "which types are legal here" questions for the
//! reflector and the loader.

pub mod builtin;
mod descriptor;
mod registry;

pub use descriptor::{ContentTypeDescriptor, PropertyDescriptor, ValueType};
pub use registry::{identifier_pattern, RegistryError, TypeRegistry};
