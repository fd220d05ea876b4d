use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tempfile::TempDir;

use crate::bus::ReloadBus;
use crate::edit::ContentHandler;
use crate::loader::{ContentLoader, FsContentLoader};
use crate::reflect::TypeReflector;
use crate::token::TransactionCodec;
use crate::types::builtin;

pub const TEST_SECRET: &[u8] = b"quill test secret";

/// A small blog: a site, one folder with one article (sidecar body), and an
/// empty folder.
pub fn blog_fixture() -> Vec<(&'static str, &'static str)> {
    vec![
        ("_index.yml", "name: Test Site\n"),
        ("000.blog.folder/_index.yml", "title: Blog\n"),
        (
            "000.blog.folder/000.post-1.article/_index.yml",
            "title: Post One\nauthor: Ada\n",
        ),
        ("000.blog.folder/000.post-1.article/@body.md", "# Post One\n"),
        ("001.notes.folder/_index.yml", "title: Notes\n"),
    ]
}

/// A content directory on disk plus a handler over it.
pub struct TestSite {
    // held for its Drop
    dir: TempDir,
    loader: Arc<FsContentLoader>,
    handler: ContentHandler,
    bus: ReloadBus,
}

impl TestSite {
    pub async fn blog() -> Result<Self> {
        Self::with_files(&blog_fixture()).await
    }

    pub async fn with_files(files: &[(&str, &str)]) -> Result<Self> {
        let dir = tempfile::tempdir()?;
        for (relative, contents) in files {
            let path = dir.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, contents)?;
        }

        let reflector = Arc::new(TypeReflector::new(Arc::new(builtin::website_registry())));
        let loader =
            Arc::new(FsContentLoader::load(dir.path(), builtin::WEBSITE, reflector.clone()).await?);
        let codec = Arc::new(TransactionCodec::new(TEST_SECRET)?);
        let bus = ReloadBus::new();
        let handler = ContentHandler::new(
            reflector,
            loader.clone() as Arc<dyn ContentLoader>,
            codec,
            bus.clone(),
            dir.path(),
        );

        Ok(Self {
            dir,
            loader,
            handler,
            bus,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(std::fs::read_to_string(self.path(relative))?)
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }

    pub fn handler(&self) -> &ContentHandler {
        &self.handler
    }

    pub fn loader(&self) -> &Arc<FsContentLoader> {
        &self.loader
    }

    pub fn bus(&self) -> &ReloadBus {
        &self.bus
    }

    /// Names of the entries directly inside `relative`, sorted.
    pub fn list(&self, relative: &str) -> Result<Vec<String>> {
        let mut names = std::fs::read_dir(self.path(relative))?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
            .collect::<std::io::Result<Vec<_>>>()?;
        names.sort();
        Ok(names)
    }
}
