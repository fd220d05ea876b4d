use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    // http server configuration
    /// Port for the HTTP server (API, preview, static files)
    pub port: u16,
    /// Base URL for links in rendered pages, defaults to localhost on `port`
    pub public_url: Option<url::Url>,

    // content configuration
    /// Root directory of the content tree
    pub content_root: PathBuf,
    /// Type name of the root content node
    pub root_type: String,
    /// YAML type-set file, if not set then the
    ///  built-in website types are used
    pub types_file: Option<PathBuf>,

    // static files
    /// Directory served under /static after the render output
    pub static_dir: Option<PathBuf>,
    /// Render output directory, if not set then a
    ///  temporary directory is used for the lifetime of the process
    pub render_dir: Option<PathBuf>,

    // transaction tokens
    /// Secret used to sign creation transactions
    pub secret: Vec<u8>,

    // logging
    pub log_level: tracing::Level,
    /// Directory for log files (optional, logs to stdout only if not set)
    pub log_dir: Option<PathBuf>,
}
