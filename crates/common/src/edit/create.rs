use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

use crate::path::ContentPath;
use crate::reflect::PropertyKind;
use crate::store::{write_property, IndexDocument, INDEX_FILE};
use crate::token::{decode_transaction, encode_transaction, CreateTransaction};

use super::{ContentHandler, EditError, Resolved};

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*$").expect("valid regex"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentCreate {
    /// Collection property of the parent that receives the child.
    pub property: String,
    pub type_identifier: String,
    pub slug: String,
    #[serde(default)]
    pub content: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateBeginResponse {
    pub transaction: String,
    pub path: ContentPath,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    pub path: ContentPath,
}

/// The verified destination of an upload.
#[derive(Debug, Clone)]
pub struct UploadTarget {
    directory: PathBuf,
    transaction: CreateTransaction,
}

impl UploadTarget {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn content_path(&self) -> &ContentPath {
        &self.transaction.content_path
    }

    /// Stream one part into the target directory under its base name.
    pub async fn write_part<S, E>(&self, file_name: &str, stream: S) -> Result<UploadedFile, EditError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let base = base_name(file_name)?;
        let destination = self.directory.join(&base);

        let result = copy_stream(&destination, stream).await;
        let size = match result {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&destination).await {
                    tracing::warn!(
                        file = %destination.display(),
                        error = %cleanup,
                        "failed to remove partial upload"
                    );
                }
                return Err(e);
            }
        };

        let mime_type = mime_guess::from_path(&base)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        tracing::info!(file = %destination.display(), size, "stored upload");
        Ok(UploadedFile {
            file_name: base,
            mime_type,
            size,
        })
    }
}

async fn copy_stream<S, E>(destination: &Path, stream: S) -> Result<u64, EditError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: std::fmt::Display,
{
    futures::pin_mut!(stream);
    let mut file = tokio::fs::File::create(destination).await?;
    let mut size = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| EditError::Validation(format!("upload interrupted: {}", e)))?;
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(size)
}

/// The last component of a client-supplied name, with both separator
/// styles stripped.
fn base_name(file_name: &str) -> Result<String, EditError> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or_default();
    if base.is_empty() || base == "." || base == ".." {
        return Err(EditError::Validation(format!(
            "invalid upload file name {:?}",
            file_name
        )));
    }
    Ok(base.to_string())
}

impl ContentHandler {
    pub async fn create_child_begin(
        &self,
        parent: &str,
        create: ContentCreate,
    ) -> Result<CreateBeginResponse, EditError> {
        let Resolved {
            tree,
            node,
            metadata,
        } = self.resolve(parent)?;
        let parent_dir = node.directory.clone().ok_or_else(|| {
            EditError::Validation(format!("{} cannot hold child directories", node.path))
        })?;

        if !slug_pattern().is_match(&create.slug) {
            return Err(EditError::Validation(format!("invalid slug {:?}", create.slug)));
        }

        let reflection = self.reflector.reflect(&node.type_name)?;
        let property = reflection.property(&create.property).ok_or_else(|| {
            EditError::Validation(format!(
                "unknown property {} for type {}",
                create.property, node.type_name
            ))
        })?;
        if !property.multi_value {
            return Err(EditError::Validation(format!(
                "{} is not a multi-valued property",
                property.name
            )));
        }
        let child_type = match &property.kind {
            PropertyKind::Nested { allowed_types, .. } => allowed_types
                .get(&create.type_identifier)
                .cloned()
                .ok_or_else(|| {
                    EditError::Validation(format!(
                        "invalid type identifier {} for {} (allowed: {})",
                        create.type_identifier,
                        property.name,
                        allowed_types.keys().cloned().collect::<Vec<_>>().join(", ")
                    ))
                })?,
            PropertyKind::Primitive { .. }
            | PropertyKind::Parsable { .. }
            | PropertyKind::FileAsset { .. }
            | PropertyKind::ContentReference
            | PropertyKind::Map { .. }
            | PropertyKind::Enum { .. } => {
                return Err(EditError::Validation(format!(
                    "{} does not hold nested content",
                    property.name
                )))
            }
        };

        let content_path = node.path.child(&create.slug);
        if tree.node(&content_path).is_some() {
            return Err(EditError::AlreadyExists(content_path.to_string()));
        }

        let siblings: Vec<_> = metadata
            .children_of(&property.name)
            .iter()
            .filter(|child| !child.is_property)
            .collect();
        let prefix = match siblings.last() {
            None => "000.".to_string(),
            Some(last) => tree
                .metadata(&last.path)
                .and_then(|meta| meta.comment.as_deref())
                .and_then(|comment| comment.parse::<u32>().ok())
                .map(|n| format!("{:03}.", n + 1))
                .unwrap_or_default(),
        };

        let directory = parent_dir.join(format!(
            "{}{}.{}",
            prefix, create.slug, create.type_identifier
        ));
        let relative = self.relative_dir(&directory)?;

        match tokio::fs::create_dir(&directory).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(EditError::AlreadyExists(relative));
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = self.write_initial(&directory, &child_type, create.content).await {
            if let Err(cleanup) = tokio::fs::remove_dir_all(&directory).await {
                tracing::warn!(
                    dir = %directory.display(),
                    error = %cleanup,
                    "failed to clean up after aborted create"
                );
            }
            return Err(e);
        }

        let transaction = CreateTransaction {
            path: relative,
            content_path: content_path.clone(),
        };
        let token = encode_transaction(&self.codec, &transaction)?;
        tracing::info!(path = %content_path, dir = %directory.display(), "child creation begun");

        Ok(CreateBeginResponse {
            transaction: token,
            path: content_path,
        })
    }

    async fn write_initial(
        &self,
        directory: &Path,
        type_name: &str,
        content: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), EditError> {
        let reflection = self.reflector.reflect(type_name)?;
        let mut doc = IndexDocument::empty(directory.join(INDEX_FILE));
        for (key, value) in content {
            let property = reflection.property(&key).ok_or_else(|| {
                EditError::Validation(format!("unknown property {} for type {}", key, type_name))
            })?;
            write_property(&mut doc, property, value)
                .await
                .map_err(|e| EditError::from_write(&key, e))?;
        }
        doc.flush().await?;
        Ok(())
    }

    /// `directory` relative to the content root, `/`-separated.
    fn relative_dir(&self, directory: &Path) -> Result<String, EditError> {
        let relative = directory.strip_prefix(&self.content_root).map_err(|_| {
            EditError::Internal(format!(
                "{} is outside the content root",
                directory.display()
            ))
        })?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Ok(parts.join("/"))
    }

    pub fn create_child_upload(&self, token: &str) -> Result<UploadTarget, EditError> {
        let transaction = decode_transaction(&self.codec, token)?;
        let relative = Path::new(&transaction.path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(EditError::Internal(format!(
                "transaction path {} is not relative",
                transaction.path
            )));
        }
        let directory = self.content_root.join(relative);
        if !directory.is_dir() {
            return Err(EditError::NotFound(transaction.content_path.to_string()));
        }
        Ok(UploadTarget {
            directory,
            transaction,
        })
    }

    /// Make the new node visible. Committing the same token twice is
    /// harmless; it reloads again.
    pub async fn create_child_commit(&self, token: &str) -> Result<CommitResponse, EditError> {
        let transaction = decode_transaction(&self.codec, token)?;
        self.reload(&transaction.content_path.parent()).await;
        tracing::info!(path = %transaction.content_path, "child creation committed");
        Ok(CommitResponse {
            path: transaction.content_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("../../evil").unwrap(), "evil");
        assert_eq!(base_name("..\\..\\evil.txt").unwrap(), "evil.txt");
        assert_eq!(base_name("plain.png").unwrap(), "plain.png");
        assert!(base_name("dir/..").is_err());
        assert!(base_name("trailing/").is_err());
        assert!(base_name("").is_err());
    }

    #[test]
    fn test_slug_pattern() {
        assert!(slug_pattern().is_match("hello-world_2"));
        assert!(!slug_pattern().is_match("@hidden"));
        assert!(!slug_pattern().is_match("has.dot"));
        assert!(!slug_pattern().is_match("a/b"));
        assert!(!slug_pattern().is_match(""));
    }
}
