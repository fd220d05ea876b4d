use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::path::ContentPath;

/// One loaded content node.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentNode {
    pub path: ContentPath,
    pub type_name: String,
    /// The inline document, or the raw text for parsable nodes.
    pub data: serde_yaml::Value,
    pub raw_content: Option<String>,
    /// Set for nodes backed by their own directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildRef {
    pub path: ContentPath,
    /// True for property-backed children (`@name`), false for collection
    /// members with their own directory.
    pub is_property: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContentMetadata {
    pub path: ContentPath,
    /// `<dir>/_index.yml` for directory nodes, whether or not it exists.
    pub fs_path: Option<PathBuf>,
    pub type_name: String,
    /// Ordinal prefix of the directory name, e.g. `003`.
    pub comment: Option<String>,
    /// Property name -> children, collection members in directory order.
    pub direct_children: BTreeMap<String, Vec<ChildRef>>,
}

impl ContentMetadata {
    pub fn children_of(&self, property: &str) -> &[ChildRef] {
        self.direct_children
            .get(property)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// An immutable snapshot of the loaded content.
#[derive(Debug, Clone, Default)]
pub struct ContentTree {
    pub nodes: BTreeMap<ContentPath, Arc<ContentNode>>,
    pub metadata: BTreeMap<ContentPath, Arc<ContentMetadata>>,
}

impl ContentTree {
    pub fn node(&self, path: &ContentPath) -> Option<&Arc<ContentNode>> {
        self.nodes.get(path)
    }

    pub fn metadata(&self, path: &ContentPath) -> Option<&Arc<ContentMetadata>> {
        self.metadata.get(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn insert(&mut self, node: ContentNode, metadata: ContentMetadata) {
        self.metadata.insert(metadata.path.clone(), Arc::new(metadata));
        self.nodes.insert(node.path.clone(), Arc::new(node));
    }

    /// A copy of this tree without `root` and its descendants.
    pub(crate) fn without_subtree(&self, root: &ContentPath) -> ContentTree {
        ContentTree {
            nodes: self
                .nodes
                .iter()
                .filter(|(path, _)| !path.starts_with(root))
                .map(|(path, node)| (path.clone(), node.clone()))
                .collect(),
            metadata: self
                .metadata
                .iter()
                .filter(|(path, _)| !path.starts_with(root))
                .map(|(path, meta)| (path.clone(), meta.clone()))
                .collect(),
        }
    }

    pub(crate) fn merge(&mut self, other: ContentTree) {
        self.nodes.extend(other.nodes);
        self.metadata.extend(other.metadata);
    }
}
