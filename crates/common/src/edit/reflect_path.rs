use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::path::ContentPath;
use crate::reflect::{ContentReflection, PropertyKind};
use crate::store::IndexDocument;

use super::{ContentHandler, EditError, Resolved};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: ContentPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub path: ContentPath,
    pub is_property: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReflectPathResponse {
    /// Root first.
    pub breadcrumbs: Vec<Breadcrumb>,
    pub reflection: Arc<ContentReflection>,
    /// The on-disk document as stored, `{}` when there is none yet.
    pub content: serde_json::Value,
    pub children: BTreeMap<String, Vec<ChildEntry>>,
    pub types: BTreeMap<String, Arc<ContentReflection>>,
}

impl ContentHandler {
    pub async fn reflect_path(&self, path: &str) -> Result<ReflectPathResponse, EditError> {
        let Resolved {
            tree,
            node,
            metadata,
        } = self.resolve(path)?;
        let reflection = self.reflector.reflect(&node.type_name)?;

        let breadcrumbs = node
            .path
            .ancestry()
            .into_iter()
            .map(|path| Breadcrumb {
                name: path.name().to_string(),
                path,
            })
            .collect();

        let content = match &metadata.fs_path {
            Some(fs_path) => IndexDocument::read(fs_path).await?.to_json()?,
            None => serde_json::to_value(&node.data)
                .map_err(|e| EditError::Internal(format!("node data is not json: {}", e)))?,
        };

        let mut children = BTreeMap::new();
        for (property, refs) in &metadata.direct_children {
            let parsable = matches!(
                reflection.property(property).map(|p| &p.kind),
                Some(PropertyKind::Parsable { .. })
            );
            let entries = refs
                .iter()
                .map(|child| ChildEntry {
                    path: child.path.clone(),
                    is_property: child.is_property,
                    raw_content: if parsable {
                        tree.node(&child.path).and_then(|n| n.raw_content.clone())
                    } else {
                        None
                    },
                })
                .collect();
            children.insert(property.clone(), entries);
        }

        let types = self.nested_type_closure(&reflection)?;

        Ok(ReflectPathResponse {
            breadcrumbs,
            reflection,
            content,
            children,
            types,
        })
    }
}
