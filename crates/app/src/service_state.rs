use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use common::bus::ReloadBus;
use common::edit::ContentHandler;
use common::loader::{ContentLoader, FsContentLoader, LoaderError};
use common::reflect::TypeReflector;
use common::render::Renderer;
use common::token::{TokenError, TransactionCodec};
use common::types::{builtin, RegistryError, TypeRegistry};

use crate::http_server::render::PreviewRenderer;
use crate::ServiceConfig;

/// Where rendered output lives. A temporary directory is removed when the
/// last state clone is dropped.
enum RenderDir {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl RenderDir {
    fn path(&self) -> &Path {
        match self {
            RenderDir::Temp(dir) => dir.path(),
            RenderDir::Fixed(path) => path,
        }
    }
}

/// Main service state - the composition root for the content stack
#[derive(Clone)]
pub struct State {
    handler: ContentHandler,
    loader: Arc<FsContentLoader>,
    renderer: Arc<dyn Renderer>,
    render_dir: Arc<RenderDir>,
    static_dir: Option<PathBuf>,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("handler", &self.handler)
            .field("render_dir", &self.render_dir.path())
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl State {
    pub async fn from_config(config: &ServiceConfig) -> Result<Self, StateSetupError> {
        // 1. Setup type registry
        let registry = match config.types_file {
            Some(ref path) => {
                tracing::info!(types = %path.display(), "loading content types");
                TypeRegistry::load(path)?
            }
            None => builtin::website_registry(),
        };
        let reflector = Arc::new(TypeReflector::new(Arc::new(registry)));

        // 2. Load the content tree
        if !config.content_root.is_dir() {
            return Err(StateSetupError::ContentRootMissing(
                config.content_root.clone(),
            ));
        }
        let loader = Arc::new(
            FsContentLoader::load(&config.content_root, &config.root_type, reflector.clone())
                .await?,
        );

        // 3. Setup token codec and reload bus
        let codec = Arc::new(TransactionCodec::new(&config.secret)?);
        let bus = ReloadBus::new();

        let handler = ContentHandler::new(
            reflector,
            loader.clone() as Arc<dyn ContentLoader>,
            codec,
            bus,
            &config.content_root,
        );

        // 4. Setup render output
        let render_dir = match config.render_dir {
            Some(ref path) => {
                std::fs::create_dir_all(path)?;
                RenderDir::Fixed(path.clone())
            }
            None => RenderDir::Temp(tempfile::tempdir()?),
        };
        tracing::debug!(render_dir = %render_dir.path().display(), "render output ready");

        Ok(Self {
            handler,
            loader,
            renderer: Arc::new(PreviewRenderer),
            render_dir: Arc::new(render_dir),
            static_dir: config.static_dir.clone(),
        })
    }

    pub fn handler(&self) -> &ContentHandler {
        &self.handler
    }

    pub fn loader(&self) -> &Arc<FsContentLoader> {
        &self.loader
    }

    pub fn bus(&self) -> &ReloadBus {
        self.handler.bus()
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn render_dir(&self) -> &Path {
        self.render_dir.path()
    }

    pub fn static_dir(&self) -> Option<&Path> {
        self.static_dir.as_deref()
    }

    /// Stop accepting reloads and drop every reload listener.
    pub fn close(&self) {
        self.loader.close();
        self.bus().clear();
        tracing::info!("content service closed");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("content root does not exist: {0}")]
    ContentRootMissing(PathBuf),
    #[error("type registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("content loader error: {0}")]
    Loader(#[from] LoaderError),
    #[error("token codec error: {0}")]
    Token(#[from] TokenError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
