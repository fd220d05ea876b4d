//! Reading and patching the on-disk representation of a node.

mod adapter;
mod document;

pub use adapter::{sidecar_name, write_property, WriteError};
pub use document::{parse_mapping, DocumentError, IndexDocument};

/// Name of the per-directory index document.
pub const INDEX_FILE: &str = "_index.yml";
