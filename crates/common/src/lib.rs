/**
 * Reload notifications fanned out to
 *  in-process listeners (live preview, etc).
 */
pub mod bus;
/**
 * The content mutation handler: reflect,
 *  create and update nodes on disk.
 */
pub mod edit;
/**
 * Loads the content tree from disk and
 *  swaps in fresh snapshots on reload.
 */
pub mod loader;
pub mod path;
/**
 * Reflection of content types into
 *  serializable schemas.
 */
pub mod reflect;
pub mod render;
/**
 * Index documents and the per-kind
 *  property write policy.
 */
pub mod store;
/**
 * Fixtures for integration tests
 */
pub mod testkit;
/**
 * Signed, stateless transaction tokens.
 */
pub mod token;
pub mod types;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::bus::{ReloadBus, ReloadEvent};
    pub use crate::edit::{ContentHandler, EditError};
    pub use crate::loader::{ContentLoader, FsContentLoader};
    pub use crate::path::ContentPath;
    pub use crate::reflect::{ContentReflection, PropertyKind, TypeReflector};
    pub use crate::token::TransactionCodec;
    pub use crate::types::TypeRegistry;
    pub use crate::version::build_info;
}
