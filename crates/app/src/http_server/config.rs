use std::net::SocketAddr;

use url::Url;

/// Settings for one HTTP listener.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Base that rendered pages use for links and static files
    pub public_url: Url,
    /// Level of the per-response trace events
    pub log_level: tracing::Level,
}

impl Config {
    /// Listen on `listen_addr`, publishing pages as `http://localhost:<port>`.
    pub fn new(listen_addr: SocketAddr) -> Result<Self, ConfigError> {
        let public_url = Url::parse(&format!("http://localhost:{}", listen_addr.port()))?;
        Ok(Self {
            listen_addr,
            public_url,
            log_level: tracing::Level::INFO,
        })
    }

    pub fn with_public_url(mut self, public_url: Url) -> Self {
        self.public_url = public_url;
        self
    }

    pub fn with_log_level(mut self, log_level: tracing::Level) -> Self {
        self.log_level = log_level;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid public url: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_follows_port() {
        let config = Config::new(SocketAddr::from(([0, 0, 0, 0], 9001))).unwrap();
        assert_eq!(config.public_url.as_str(), "http://localhost:9001/");

        let custom = Url::parse("https://preview.example.com/").unwrap();
        let config = config.with_public_url(custom.clone());
        assert_eq!(config.public_url, custom);
    }
}
