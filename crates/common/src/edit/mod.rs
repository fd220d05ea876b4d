//! Content mutation handler
//!
//! [`ContentHandler`] is the transport-agnostic core of the editing API.
//! It resolves paths against the current content snapshot, consults the
//! reflected schema, writes through the property store, and asks the loader
//! to reload whatever it touched. Successful reloads are announced on the
//! [`ReloadBus`].
//!
//! Creating a child is a three step protocol:
//!
//! 1. `create_child_begin` makes the directory, writes the initial
//!    properties, and returns a signed transaction token.
//! 2. `create_child_upload` (zero or more times) streams files into the new
//!    directory.
//! 3. `create_child_commit` reloads the parent so the node becomes visible.
//!
//! Tokens carry all transaction state; a token that fails verification is
//! rejected before anything touches the filesystem.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bus::{ReloadBus, ReloadEvent};
use crate::loader::{ContentLoader, ContentMetadata, ContentNode, ContentTree};
use crate::path::ContentPath;
use crate::reflect::{ContentReflection, TypeReflector};
use crate::token::TransactionCodec;
use crate::types::TypeRegistry;

mod create;
mod error;
mod reflect_path;
mod update;

pub use create::{
    CommitResponse, ContentCreate, CreateBeginResponse, UploadTarget, UploadedFile,
};
pub use error::EditError;
pub use reflect_path::{Breadcrumb, ChildEntry, ReflectPathResponse};
pub use update::UpdateResponse;

/// A node and its metadata, together with the snapshot they were read from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub tree: Arc<ContentTree>,
    pub node: Arc<ContentNode>,
    pub metadata: Arc<ContentMetadata>,
}

#[derive(Clone)]
pub struct ContentHandler {
    registry: Arc<TypeRegistry>,
    reflector: Arc<TypeReflector>,
    loader: Arc<dyn ContentLoader>,
    codec: Arc<TransactionCodec>,
    bus: ReloadBus,
    content_root: PathBuf,
}

impl std::fmt::Debug for ContentHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentHandler")
            .field("content_root", &self.content_root)
            .field("bus", &self.bus)
            .finish()
    }
}

impl ContentHandler {
    pub fn new(
        reflector: Arc<TypeReflector>,
        loader: Arc<dyn ContentLoader>,
        codec: Arc<TransactionCodec>,
        bus: ReloadBus,
        content_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry: reflector.registry().clone(),
            reflector,
            loader,
            codec,
            bus,
            content_root: content_root.into(),
        }
    }

    pub fn content_root(&self) -> &Path {
        &self.content_root
    }

    pub fn loader(&self) -> &Arc<dyn ContentLoader> {
        &self.loader
    }

    pub fn bus(&self) -> &ReloadBus {
        &self.bus
    }

    /// Look up `path` in the current snapshot. Callers that need other nodes
    /// should read them from [`Resolved::tree`] so every lookup sees the same
    /// snapshot.
    pub fn resolve(&self, path: &str) -> Result<Resolved, EditError> {
        let content_path =
            ContentPath::parse(path).map_err(|_| EditError::NotFound(path.to_string()))?;
        let tree = self.loader.tree();
        let node = tree
            .node(&content_path)
            .ok_or_else(|| EditError::NotFound(content_path.to_string()))?;
        let metadata = tree
            .metadata(&content_path)
            .ok_or_else(|| EditError::Internal(format!("node {} has no metadata", content_path)))?
            .clone();
        Ok(Resolved {
            node: node.clone(),
            metadata,
            tree,
        })
    }

    pub fn list_types(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, Arc<ContentReflection>>, EditError> {
        let mut types = BTreeMap::new();
        for name in names {
            if self.registry.get(name).is_none() {
                return Err(EditError::Validation(format!(
                    "{} is not a content type",
                    name
                )));
            }
            types.insert(name.clone(), self.reflector.reflect(name)?);
        }
        Ok(types)
    }

    /// Reload the subtree at `path` and notify listeners. Failures are
    /// logged; the mutation that triggered the reload already succeeded.
    pub async fn reload(&self, path: &ContentPath) {
        match self.loader.reload(path).await {
            Ok(_) => {
                let delivered = self.bus.publish(&ReloadEvent { path: path.clone() });
                tracing::debug!(%path, delivered, "content reloaded");
            }
            Err(e) => tracing::error!(%path, error = %e, "failed to reload content"),
        }
    }

    /// Schemas of every type reachable through nested properties.
    fn nested_type_closure(
        &self,
        root: &ContentReflection,
    ) -> Result<BTreeMap<String, Arc<ContentReflection>>, EditError> {
        let mut types = BTreeMap::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: Vec<String> = root
            .nested_type_names()
            .into_iter()
            .map(str::to_string)
            .collect();

        while let Some(name) = queue.pop() {
            if !seen.insert(name.clone()) {
                continue;
            }
            let reflection = self.reflector.reflect(&name)?;
            queue.extend(
                reflection
                    .nested_type_names()
                    .into_iter()
                    .filter(|n| !seen.contains(*n))
                    .map(str::to_string),
            );
            types.insert(name, reflection);
        }
        Ok(types)
    }
}
