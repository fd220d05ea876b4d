//! Content tree loading
//!
//! The loader owns the in-memory [`ContentTree`]. Readers take a cheap
//! `Arc` snapshot; reloads build a new tree and swap it in, so a snapshot
//! captured by an in-flight request never changes underneath it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;

use crate::path::ContentPath;
use crate::reflect::ReflectError;
use crate::store::DocumentError;

mod fs;
mod tree;

pub use fs::FsContentLoader;
pub use tree::{ChildRef, ContentMetadata, ContentNode, ContentTree};

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("content loader is closed")]
    Closed,
    #[error("unknown content type: {0}")]
    UnknownType(String),
    #[error("no loaded content at or above {0}")]
    NotFound(ContentPath),
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document error: {0}")]
    Document(#[from] DocumentError),
    #[error("reflection error: {0}")]
    Reflect(#[from] ReflectError),
    #[error("load task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait ContentLoader: Send + Sync {
    /// The current snapshot.
    fn tree(&self) -> Arc<ContentTree>;

    /// Re-read the subtree containing `path` and publish a new snapshot.
    async fn reload(&self, path: &ContentPath) -> Result<Arc<ContentTree>, LoaderError>;

    fn close(&self);

    fn is_closed(&self) -> bool;
}
