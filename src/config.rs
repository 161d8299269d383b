use crate::error::{ParserError, Result};
use crate::http_client::{EnhancedHttpClient, HttpClientConfig};
use crate::pagination::Paginator;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Per-source overrides keyed by lowercase source name
    #[serde(default)]
    pub sources: HashMap<String, SourceOverride>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HttpConfig {
    /// Timeout for HTTP requests in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Enable gzip/brotli compression
    #[serde(default = "default_true")]
    pub enable_compression: bool,

    /// Fixed User-Agent; a random browser agent is used per request when unset
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct PaginationConfig {
    /// Delay between consecutive page requests in milliseconds
    #[serde(default)]
    pub page_delay_ms: u64,

    /// Upper bound on pages fetched per walk
    #[serde(default)]
    pub max_pages: Option<u32>,
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SourceOverride {
    pub domain: Option<String>,
}

fn default_true() -> bool { true }
fn default_timeout() -> u64 { 30 }

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            enable_compression: true,
            user_agent: None,
        }
    }
}

impl Config {
    /// Read `config.toml` from the working directory, falling back to
    /// defaults when it is missing or invalid.
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            match Self::from_path(path) {
                Ok(cfg) => return cfg,
                Err(e) => log::warn!("Ignoring config.toml: {}", e),
            }
        }
        Self::default()
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ParserError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content).map_err(|e| ParserError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Domain override for a source, if configured
    pub fn domain_for(&self, source: &str) -> Option<&str> {
        self.sources
            .get(&source.to_lowercase())
            .and_then(|s| s.domain.as_deref())
            .filter(|d| !d.trim().is_empty())
    }
}

impl HttpConfig {
    /// Create the reqwest-backed gateway from this configuration
    pub fn create_http_client(&self) -> Result<EnhancedHttpClient> {
        EnhancedHttpClient::with_config(HttpClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            enable_gzip: self.enable_compression,
            user_agent: self.user_agent.clone(),
        })
    }
}

impl PaginationConfig {
    pub fn paginator(&self, first_page: u32) -> Paginator {
        Paginator::new(first_page)
            .with_max_pages(self.max_pages)
            .with_delay(Duration::from_millis(self.page_delay_ms))
    }
}
