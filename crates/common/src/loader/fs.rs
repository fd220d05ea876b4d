use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use serde_yaml::{Mapping, Value};

use crate::path::ContentPath;
use crate::reflect::{ContentReflection, PropertyKind, TypeReflector};
use crate::store::{parse_mapping, INDEX_FILE};

use super::tree::{ChildRef, ContentMetadata, ContentNode, ContentTree};
use super::{ContentLoader, LoaderError};

/// `[NNN.]<slug>.<identifier>`
fn child_dir_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(\d+)\.)?([^.]+)\.([A-Za-z0-9][A-Za-z0-9_-]*)$").expect("valid regex")
    })
}

/// Loads the content tree from a directory of `_index.yml` documents.
pub struct FsContentLoader {
    root_dir: PathBuf,
    root_type: String,
    reflector: Arc<TypeReflector>,
    tree: RwLock<Arc<ContentTree>>,
    reload_lock: tokio::sync::Mutex<()>,
    closed: AtomicBool,
}

impl std::fmt::Debug for FsContentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsContentLoader")
            .field("root_dir", &self.root_dir)
            .field("root_type", &self.root_type)
            .field("nodes", &self.tree.read().len())
            .finish()
    }
}

impl FsContentLoader {
    pub async fn load(
        root_dir: impl Into<PathBuf>,
        root_type: impl Into<String>,
        reflector: Arc<TypeReflector>,
    ) -> Result<Self, LoaderError> {
        let root_dir = root_dir.into();
        let root_type = root_type.into();
        if reflector.registry().get(&root_type).is_none() {
            return Err(LoaderError::UnknownType(root_type));
        }

        let walker = Walker {
            reflector: reflector.clone(),
        };
        let dir = root_dir.clone();
        let ty = root_type.clone();
        let tree = tokio::task::spawn_blocking(move || {
            let mut tree = ContentTree::default();
            walker.parse_directory(&dir, ContentPath::root(), &ty, None, &mut tree)?;
            Ok::<_, LoaderError>(tree)
        })
        .await??;

        tracing::info!(
            root = %root_dir.display(),
            nodes = tree.len(),
            "content tree loaded"
        );

        Ok(Self {
            root_dir,
            root_type,
            reflector,
            tree: RwLock::new(Arc::new(tree)),
            reload_lock: tokio::sync::Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn root_type(&self) -> &str {
        &self.root_type
    }

    /// The closest directory-backed node at or above `path`.
    fn reload_anchor(
        tree: &ContentTree,
        path: &ContentPath,
    ) -> Option<(Arc<ContentNode>, Arc<ContentMetadata>)> {
        path.ancestry().into_iter().rev().find_map(|candidate| {
            let node = tree.node(&candidate)?;
            node.directory.as_ref()?;
            let meta = tree.metadata(&candidate)?;
            Some((node.clone(), meta.clone()))
        })
    }
}

#[async_trait]
impl ContentLoader for FsContentLoader {
    fn tree(&self) -> Arc<ContentTree> {
        self.tree.read().clone()
    }

    async fn reload(&self, path: &ContentPath) -> Result<Arc<ContentTree>, LoaderError> {
        if self.is_closed() {
            return Err(LoaderError::Closed);
        }
        let _guard = self.reload_lock.lock().await;

        let current = self.tree();
        let (node, meta) = Self::reload_anchor(&current, path)
            .ok_or_else(|| LoaderError::NotFound(path.clone()))?;
        let directory = node
            .directory
            .clone()
            .ok_or_else(|| LoaderError::NotFound(path.clone()))?;

        let walker = Walker {
            reflector: self.reflector.clone(),
        };
        let anchor = node.path.clone();
        let type_name = node.type_name.clone();
        let comment = meta.comment.clone();
        let subtree = tokio::task::spawn_blocking(move || {
            let mut subtree = ContentTree::default();
            walker.parse_directory(&directory, anchor, &type_name, comment, &mut subtree)?;
            Ok::<_, LoaderError>(subtree)
        })
        .await??;

        let mut next = current.without_subtree(&node.path);
        next.merge(subtree);
        let next = Arc::new(next);
        *self.tree.write() = next.clone();

        tracing::debug!(path = %node.path, nodes = next.len(), "reloaded content subtree");
        Ok(next)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct Walker {
    reflector: Arc<TypeReflector>,
}

struct ChildDir {
    dir_name: String,
    dir: PathBuf,
    comment: Option<String>,
    slug: String,
    identifier: String,
}

impl ChildDir {
    /// Numeric prefix, or `None` for unprefixed directories, which sort first.
    fn ordinal(&self) -> Option<u64> {
        self.comment.as_deref().and_then(|c| c.parse().ok())
    }
}

impl Walker {
    fn parse_directory(
        &self,
        dir: &Path,
        path: ContentPath,
        type_name: &str,
        comment: Option<String>,
        out: &mut ContentTree,
    ) -> Result<(), LoaderError> {
        let reflection = self.reflector.reflect(type_name)?;
        let fs_path = dir.join(INDEX_FILE);
        let mapping = read_mapping(&fs_path)?;
        let (files, dirs) = list_dir(dir)?;

        let mut direct_children: BTreeMap<String, Vec<ChildRef>> = BTreeMap::new();

        for property in &reflection.properties {
            let child_path = path.child(format!("@{}", property.name));
            match &property.kind {
                PropertyKind::Parsable { parsable_types } => {
                    let Some((child_type, raw)) =
                        parsable_content(dir, &files, &mapping, &property.name, parsable_types)?
                    else {
                        continue;
                    };
                    out.insert(
                        ContentNode {
                            path: child_path.clone(),
                            type_name: child_type.clone(),
                            data: Value::String(raw.clone()),
                            raw_content: Some(raw),
                            directory: None,
                        },
                        property_metadata(child_path.clone(), child_type),
                    );
                    push_child(&mut direct_children, &property.name, child_path, true);
                }
                PropertyKind::Nested { base_type, .. } if !property.multi_value => {
                    let Some(value @ Value::Mapping(_)) = mapping.get(property.name.as_str()) else {
                        continue;
                    };
                    out.insert(
                        ContentNode {
                            path: child_path.clone(),
                            type_name: base_type.clone(),
                            data: value.clone(),
                            raw_content: None,
                            directory: None,
                        },
                        property_metadata(child_path.clone(), base_type.clone()),
                    );
                    push_child(&mut direct_children, &property.name, child_path, true);
                }
                PropertyKind::Nested { .. }
                | PropertyKind::Primitive { .. }
                | PropertyKind::FileAsset { .. }
                | PropertyKind::ContentReference
                | PropertyKind::Map { .. }
                | PropertyKind::Enum { .. } => {}
            }
        }

        let collections = self.collection_slots(type_name, &reflection);
        for child in dirs {
            let Some((property, child_type)) = collections
                .iter()
                .find_map(|(property, allowed)| {
                    allowed
                        .get(&child.identifier)
                        .map(|child_type| (property.clone(), child_type.clone()))
                })
            else {
                tracing::debug!(dir = %child.dir.display(), "no collection accepts directory, skipping");
                continue;
            };

            let child_path = path.child(&child.slug);
            if out.node(&child_path).is_some() {
                tracing::warn!(
                    dir = %child.dir.display(),
                    path = %child_path,
                    "duplicate slug, skipping directory"
                );
                continue;
            }
            self.parse_directory(&child.dir, child_path.clone(), &child_type, child.comment, out)?;
            push_child(&mut direct_children, &property, child_path, false);
            tracing::trace!(dir = %child.dir_name, "loaded child directory");
        }

        out.insert(
            ContentNode {
                path: path.clone(),
                type_name: type_name.to_string(),
                data: Value::Mapping(mapping),
                raw_content: None,
                directory: Some(dir.to_path_buf()),
            },
            ContentMetadata {
                path,
                fs_path: Some(fs_path),
                type_name: type_name.to_string(),
                comment,
                direct_children,
            },
        );
        Ok(())
    }

    /// Multi-valued nested properties in declaration order, with their
    /// allowed identifier -> type maps.
    fn collection_slots(
        &self,
        type_name: &str,
        reflection: &ContentReflection,
    ) -> Vec<(String, BTreeMap<String, String>)> {
        self.reflector
            .registry()
            .properties(type_name)
            .into_iter()
            .filter_map(|declared| {
                let property = reflection.property(&declared.name)?;
                match &property.kind {
                    PropertyKind::Nested { allowed_types, .. } if property.multi_value => {
                        Some((property.name.clone(), allowed_types.clone()))
                    }
                    _ => None,
                }
            })
            .collect()
    }
}

fn push_child(
    children: &mut BTreeMap<String, Vec<ChildRef>>,
    property: &str,
    path: ContentPath,
    is_property: bool,
) {
    children
        .entry(property.to_string())
        .or_default()
        .push(ChildRef { path, is_property });
}

fn property_metadata(path: ContentPath, type_name: String) -> ContentMetadata {
    ContentMetadata {
        path,
        fs_path: None,
        type_name,
        comment: None,
        direct_children: BTreeMap::new(),
    }
}

fn read_mapping(fs_path: &Path) -> Result<Mapping, LoaderError> {
    match std::fs::read_to_string(fs_path) {
        Ok(source) => Ok(parse_mapping(fs_path, &source)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Mapping::new()),
        Err(source) => Err(LoaderError::Io {
            path: fs_path.to_path_buf(),
            source,
        }),
    }
}

/// Regular file names, and recognized child directories sorted by ordinal
/// prefix, then by name.
fn list_dir(dir: &Path) -> Result<(Vec<String>, Vec<ChildDir>), LoaderError> {
    let io = |source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        let name = entry.file_name().to_string_lossy().to_string();
        let file_type = entry.file_type().map_err(io)?;
        if file_type.is_file() {
            files.push(name);
            continue;
        }
        if !file_type.is_dir() || name.starts_with(['.', '_', '@']) {
            continue;
        }
        let Some(captures) = child_dir_pattern().captures(&name) else {
            tracing::debug!(dir = %entry.path().display(), "unrecognized directory name, skipping");
            continue;
        };
        dirs.push(ChildDir {
            comment: captures.get(1).map(|m| m.as_str().to_string()),
            slug: captures[2].to_string(),
            identifier: captures[3].to_string(),
            dir: entry.path(),
            dir_name: name,
        });
    }
    files.sort();
    dirs.sort_by(|a, b| {
        a.ordinal()
            .cmp(&b.ordinal())
            .then_with(|| a.dir_name.cmp(&b.dir_name))
    });
    Ok((files, dirs))
}

/// Raw text and concrete type of a parsable property, inline first.
fn parsable_content(
    dir: &Path,
    files: &[String],
    mapping: &Mapping,
    property: &str,
    parsable_types: &BTreeMap<String, String>,
) -> Result<Option<(String, String)>, LoaderError> {
    if let Some(Value::String(inline)) = mapping.get(property) {
        let Some(type_name) = parsable_types.values().next() else {
            return Ok(None);
        };
        return Ok(Some((type_name.clone(), inline.clone())));
    }

    let prefix = format!("@{}.", property);
    let matches: Vec<(&String, &String)> = files
        .iter()
        .filter_map(|file| {
            let extension = file.strip_prefix(&prefix)?;
            parsable_types.get(extension).map(|ty| (file, ty))
        })
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [(file, type_name)] => {
            let sidecar = dir.join(file);
            let raw = std::fs::read_to_string(&sidecar).map_err(|source| LoaderError::Io {
                path: sidecar.clone(),
                source,
            })?;
            Ok(Some(((*type_name).clone(), raw)))
        }
        _ => {
            tracing::warn!(
                dir = %dir.display(),
                property,
                "more than one sidecar for property, ignoring"
            );
            Ok(None)
        }
    }
}
