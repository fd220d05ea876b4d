use std::io::Write;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid yaml in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0} does not contain a yaml mapping")]
    NotAMapping(PathBuf),
    #[error("document {path} cannot be represented as json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl DocumentError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        DocumentError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parse the body of an index document. Empty input is an empty mapping.
pub fn parse_mapping(path: &Path, source: &str) -> Result<Mapping, DocumentError> {
    if source.trim().is_empty() {
        return Ok(Mapping::new());
    }
    let value: Value = serde_yaml::from_str(source).map_err(|source| DocumentError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        _ => Err(DocumentError::NotAMapping(path.to_path_buf())),
    }
}

/// Mode given to content files created by a write.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Write `contents` next to `path` and rename it into place.
///
/// The replacement takes over the permissions of the file it replaces. On
/// unix a new file is created with [`NEW_FILE_MODE`] rather than the
/// owner-only mode of the temp file.
pub(crate) async fn write_atomic(path: &Path, contents: Vec<u8>) -> std::io::Result<()> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::NamedTempFile::new_in(dir)?;
        file.write_all(&contents)?;
        if let Some(permissions) = target_permissions(&path)? {
            file.as_file().set_permissions(permissions)?;
        }
        file.as_file().sync_all()?;
        file.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}

fn target_permissions(path: &Path) -> std::io::Result<Option<std::fs::Permissions>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(std::fs::Permissions::from_mode(NEW_FILE_MODE))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<std::fs::Permissions> {
    None
}

/// An editable `_index.yml` document.
///
/// Key order is preserved. Nothing is written until [`IndexDocument::flush`],
/// and only if a property was actually set.
#[derive(Debug, Clone)]
pub struct IndexDocument {
    path: PathBuf,
    mapping: Mapping,
    dirty: bool,
}

impl IndexDocument {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mapping: Mapping::new(),
            dirty: false,
        }
    }

    pub async fn read(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let source = match tokio::fs::read_to_string(&path).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::empty(path)),
            Err(e) => return Err(DocumentError::io(&path, e)),
        };
        let mapping = parse_mapping(&path, &source)?;
        Ok(Self {
            path,
            mapping,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the document and its sidecar files.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.mapping.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.mapping.contains_key(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.mapping.insert(Value::String(key.to_string()), value);
        self.dirty = true;
    }

    /// Drop `key` from the document. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let removed = self.mapping.shift_remove(key).is_some();
        self.dirty |= removed;
        removed
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn to_json(&self) -> Result<serde_json::Value, DocumentError> {
        serde_json::to_value(&self.mapping).map_err(|source| DocumentError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Persist the document if it changed. Returns whether a write happened.
    pub async fn flush(&mut self) -> Result<bool, DocumentError> {
        if !self.dirty {
            return Ok(false);
        }
        let buffer = serde_yaml::to_string(&self.mapping).map_err(|source| DocumentError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        write_atomic(&self.path, buffer.into_bytes())
            .await
            .map_err(|e| DocumentError::io(&self.path, e))?;
        self.dirty = false;
        tracing::debug!(path = %self.path.display(), "flushed index document");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = IndexDocument::read(dir.path().join("_index.yml"))
            .await
            .unwrap();
        assert!(doc.mapping().is_empty());
        assert!(!doc.is_dirty());
    }

    #[tokio::test]
    async fn test_flush_only_when_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_index.yml");
        let mut doc = IndexDocument::read(&path).await.unwrap();
        assert!(!doc.flush().await.unwrap());
        assert!(!path.exists());

        doc.set("title", Value::String("Hello".into()));
        assert!(doc.flush().await.unwrap());
        assert!(!doc.is_dirty());

        let reread = IndexDocument::read(&path).await.unwrap();
        assert_eq!(reread.get("title"), Some(&Value::String("Hello".into())));
    }

    #[tokio::test]
    async fn test_key_order_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_index.yml");
        std::fs::write(&path, "zeta: 1\nalpha: 2\n").unwrap();

        let mut doc = IndexDocument::read(&path).await.unwrap();
        doc.set("middle", Value::Bool(true));
        doc.flush().await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let zeta = written.find("zeta").unwrap();
        let alpha = written.find("alpha").unwrap();
        let middle = written.find("middle").unwrap();
        assert!(zeta < alpha && alpha < middle);
    }

    #[tokio::test]
    async fn test_rejects_non_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_index.yml");
        std::fs::write(&path, "- a\n- b\n").unwrap();
        let result = IndexDocument::read(&path).await;
        assert!(matches!(result, Err(DocumentError::NotAMapping(_))));
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = IndexDocument::empty(dir.path().join("_index.yml"));
        doc.set("a", Value::Bool(false));
        doc.flush().await.unwrap();
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_flush_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_index.yml");
        std::fs::write(&path, "title: Old\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o640)).unwrap();

        let mut doc = IndexDocument::read(&path).await.unwrap();
        doc.set("title", Value::String("New".into()));
        doc.flush().await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
        assert!(std::fs::read_to_string(&path).unwrap().contains("New"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let mut doc = IndexDocument::empty(dir.path().join("_index.yml"));
        doc.set("a", Value::Bool(true));
        doc.flush().await.unwrap();

        let mode = std::fs::metadata(doc.path()).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[tokio::test]
    async fn test_remove_marks_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = IndexDocument::empty(dir.path().join("_index.yml"));
        assert!(!doc.remove("missing"));
        assert!(!doc.is_dirty());
        doc.set("a", Value::Bool(true));
        doc.flush().await.unwrap();
        assert!(doc.remove("a"));
        assert!(doc.is_dirty());
        assert!(!doc.contains("a"));
    }
}
