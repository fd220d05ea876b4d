use std::path::PathBuf;

use clap::Args;

use quill_daemon::state::{AppConfig, AppState, StateError};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Content tree root (relative paths resolve against the config directory)
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// API server port
    #[arg(long)]
    pub api_port: Option<u16>,

    /// Directory served under /static
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// YAML type-set file (defaults to the built-in website types)
    #[arg(long)]
    pub types_file: Option<PathBuf>,

    /// Type name of the root content node
    #[arg(long)]
    pub root_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] StateError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        let defaults = AppConfig::default();
        let config = AppConfig {
            api_port: self.api_port.unwrap_or(defaults.api_port),
            content_dir: self.content_dir.clone().unwrap_or(defaults.content_dir),
            static_dir: self.static_dir.clone(),
            root_type: self.root_type.clone().unwrap_or(defaults.root_type),
            types_file: self.types_file.clone(),
        };

        let state = AppState::init(ctx.config_path.clone(), Some(config))?;

        let content_dir = state.content_dir();
        if !content_dir.exists() {
            std::fs::create_dir_all(&content_dir).map_err(StateError::from)?;
        }

        let output = format!(
            "Initialized quill directory at: {}\n\
             - Config: {}\n\
             - Secret: {}\n\
             - Content: {}\n\
             - Root type: {}\n\
             - API port: {}",
            state.quill_dir.display(),
            state.config_path.display(),
            state.secret_path.display(),
            content_dir.display(),
            state.config.root_type,
            state.config.api_port,
        );

        Ok(output)
    }
}
