use std::path::PathBuf;

use clap::Args;

use quill_daemon::state::{AppState, StateError};
use quill_daemon::process::ProcessError;
use quill_daemon::{spawn_service, ServiceConfig};

#[derive(Args, Debug, Clone)]
pub struct Serve {
    /// Override API server port (default from config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Base URL used for links in rendered pages
    #[arg(long)]
    pub public_url: Option<url::Url>,

    /// Override the content tree root (default from config)
    #[arg(long)]
    pub content_dir: Option<PathBuf>,

    /// Override the directory served under /static
    #[arg(long)]
    pub static_dir: Option<PathBuf>,

    /// Token secret; the generated secret.key is used when unset
    #[arg(long, env = "QUILL_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// Keep rendered output here instead of a temporary directory
    #[arg(long)]
    pub render_dir: Option<PathBuf>,

    /// Directory for log files (logs to stdout only if not set)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("state error: {0}")]
    StateError(#[from] StateError),
    #[error(transparent)]
    Process(#[from] ProcessError),
}

#[async_trait::async_trait]
impl crate::cli::op::Op for Serve {
    type Error = ServeError;
    type Output = String;

    async fn execute(&self, ctx: &crate::cli::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from config path (or default ~/.quill)
        let state = AppState::load(ctx.config_path.clone())?;

        let secret = match self.secret {
            Some(ref secret) => secret.as_bytes().to_vec(),
            None => state.load_secret()?,
        };

        let config = ServiceConfig {
            port: self.port.unwrap_or(state.config.api_port),
            public_url: self.public_url.clone(),
            content_root: self
                .content_dir
                .clone()
                .unwrap_or_else(|| state.content_dir()),
            root_type: state.config.root_type.clone(),
            types_file: state.types_file(),
            static_dir: self.static_dir.clone().or_else(|| state.static_dir()),
            render_dir: self.render_dir.clone(),
            secret,
            log_level: tracing::Level::INFO,
            log_dir: self.log_dir.clone(),
        };

        spawn_service(&config).await?;
        Ok("server stopped".to_string())
    }
}
