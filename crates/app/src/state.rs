use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

pub const APP_NAME: &str = "quill";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const SECRET_FILE_NAME: &str = "secret.key";

/// Bytes of randomness in a generated token secret.
const SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Port for the HTTP server (API, preview, static files)
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    /// Root directory of the content tree
    pub content_dir: PathBuf,
    /// Directory served under /static when a file is not in the render output
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    /// Type name of the root content node
    #[serde(default = "default_root_type")]
    pub root_type: String,
    /// YAML type-set file; the built-in website types are used when unset
    #[serde(default)]
    pub types_file: Option<PathBuf>,
}

fn default_api_port() -> u16 {
    8012
}

fn default_root_type() -> String {
    common::types::builtin::WEBSITE.to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            content_dir: PathBuf::from("content"),
            static_dir: None,
            root_type: default_root_type(),
            types_file: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// Path to the quill directory (~/.quill)
    pub quill_dir: PathBuf,
    /// Path to the token secret
    pub secret_path: PathBuf,
    /// Path to the config file
    pub config_path: PathBuf,
    /// Loaded configuration
    pub config: AppConfig,
}

impl AppState {
    /// Get the quill directory path (custom or default ~/.quill)
    pub fn quill_dir(custom_path: Option<PathBuf>) -> Result<PathBuf, StateError> {
        if let Some(path) = custom_path {
            return Ok(path);
        }

        let home = dirs::home_dir().ok_or(StateError::NoHomeDirectory)?;
        Ok(home.join(format!(".{}", APP_NAME)))
    }

    /// Initialize a new quill state directory
    pub fn init(
        custom_path: Option<PathBuf>,
        config: Option<AppConfig>,
    ) -> Result<Self, StateError> {
        let quill_dir = Self::quill_dir(custom_path)?;

        if quill_dir.exists() {
            return Err(StateError::AlreadyInitialized);
        }

        fs::create_dir_all(&quill_dir)?;

        // Generate and save the token secret
        let mut secret = [0u8; SECRET_LEN];
        getrandom::getrandom(&mut secret).map_err(|e| StateError::InvalidSecret(e.to_string()))?;
        let secret_path = quill_dir.join(SECRET_FILE_NAME);
        fs::write(&secret_path, hex::encode(secret))?;

        let config = config.unwrap_or_default();
        let config_path = quill_dir.join(CONFIG_FILE_NAME);
        let config_toml = toml::to_string_pretty(&config)?;
        fs::write(&config_path, config_toml)?;

        Ok(Self {
            quill_dir,
            secret_path,
            config_path,
            config,
        })
    }

    /// Load existing state from the quill directory
    pub fn load(custom_path: Option<PathBuf>) -> Result<Self, StateError> {
        let quill_dir = Self::quill_dir(custom_path)?;

        if !quill_dir.exists() {
            return Err(StateError::NotInitialized);
        }

        let secret_path = quill_dir.join(SECRET_FILE_NAME);
        let config_path = quill_dir.join(CONFIG_FILE_NAME);

        if !secret_path.exists() {
            return Err(StateError::MissingFile(SECRET_FILE_NAME.to_string()));
        }
        if !config_path.exists() {
            return Err(StateError::MissingFile(CONFIG_FILE_NAME.to_string()));
        }

        let config_toml = fs::read_to_string(&config_path)?;
        let config: AppConfig = toml::from_str(&config_toml)?;

        Ok(Self {
            quill_dir,
            secret_path,
            config_path,
            config,
        })
    }

    /// Load the token secret from the secret file
    pub fn load_secret(&self) -> Result<Vec<u8>, StateError> {
        let encoded = fs::read_to_string(&self.secret_path)?;
        let secret =
            hex::decode(encoded.trim()).map_err(|e| StateError::InvalidSecret(e.to_string()))?;
        if secret.is_empty() {
            return Err(StateError::InvalidSecret("secret is empty".to_string()));
        }
        Ok(secret)
    }

    /// Content directory, relative paths resolved against the quill directory
    pub fn content_dir(&self) -> PathBuf {
        self.resolve(&self.config.content_dir)
    }

    pub fn static_dir(&self) -> Option<PathBuf> {
        self.config.static_dir.as_ref().map(|p| self.resolve(p))
    }

    pub fn types_file(&self) -> Option<PathBuf> {
        self.config.types_file.as_ref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &std::path::Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.quill_dir.join(path)
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("quill directory not initialized. Run 'quill init' first")]
    NotInitialized,

    #[error("quill directory already initialized")]
    AlreadyInitialized,

    #[error("no home directory found")]
    NoHomeDirectory,

    #[error("missing required file: {0}")]
    MissingFile(String),

    #[error("invalid secret: {0}")]
    InvalidSecret(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
}
