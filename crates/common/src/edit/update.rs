use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::{write_property, IndexDocument};

use super::{ContentHandler, EditError, Resolved};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateResponse {
    /// Keys that were not written.
    pub unsaved: Vec<String>,
    /// Reason per unsaved key.
    pub errors: BTreeMap<String, String>,
}

impl UpdateResponse {
    fn reject(&mut self, key: String, reason: String) {
        self.errors.insert(key.clone(), reason);
        self.unsaved.push(key);
    }
}

impl ContentHandler {
    /// Apply `updates` to the node at `path`.
    ///
    /// Keys are applied independently: an unknown or unwritable key is
    /// reported in the response and the rest still land. Only io failures
    /// abort the whole update.
    pub async fn update_path(
        &self,
        path: &str,
        updates: serde_json::Map<String, serde_json::Value>,
    ) -> Result<UpdateResponse, EditError> {
        let Resolved { node, metadata, .. } = self.resolve(path)?;
        let fs_path = metadata.fs_path.as_ref().ok_or_else(|| {
            EditError::Validation(format!("{} is not backed by an index document", node.path))
        })?;
        let reflection = self.reflector.reflect(&node.type_name)?;
        let mut doc = IndexDocument::read(fs_path).await?;
        let mut response = UpdateResponse::default();

        for (key, value) in updates {
            let Some(property) = reflection.property(&key) else {
                response.reject(key, "unknown property".to_string());
                continue;
            };
            match write_property(&mut doc, property, value).await {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(EditError::from_write(&key, e)),
                Err(e) => {
                    tracing::debug!(path = %node.path, key, error = %e, "property not saved");
                    response.reject(key, e.to_string());
                }
            }
        }

        doc.flush().await?;
        self.reload(&node.path).await;

        if !response.unsaved.is_empty() {
            tracing::info!(path = %node.path, unsaved = ?response.unsaved, "update partially applied");
        }
        Ok(response)
    }
}
