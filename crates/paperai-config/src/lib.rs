//! Configuration loading for PaperAI.
//! Reads paperai.toml from the current directory or the path in the
//! PAPERAI_CONFIG env var. A missing file means "all defaults".

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const CONFIG_ENV: &str = "PAPERAI_CONFIG";
pub const BACKEND_URL_ENV: &str = "PAPERAI_BACKEND_URL";
pub const BIND_ENV: &str = "PAPERAI_BIND";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io { path: String, source: std::io::Error },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory served under /static.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_bind()       -> String { "127.0.0.1:3000".to_string() }
fn default_static_dir() -> String { "static".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), static_dir: default_static_dir() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Unset leaves requests to the transport's default behavior.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_base_url() -> String { "http://localhost:3001".to_string() }

impl Default for BackendConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_secs: None }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_edit_mode")]
    pub edit_mode: String,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    /// Advertised to the file picker; the backend decides what it parses.
    #[serde(default = "default_accept")]
    pub accept: Vec<String>,
}

fn default_edit_mode() -> String      { "minimal".to_string() }
fn default_max_bytes() -> usize       { 25 * 1024 * 1024 }
fn default_accept()    -> Vec<String> { vec![".pdf".to_string(), ".txt".to_string()] }

impl Default for UploadConfig {
    fn default() -> Self {
        Self { edit_mode: default_edit_mode(), max_bytes: default_max_bytes(), accept: default_accept() }
    }
}

impl UploadConfig {
    /// Value of the file input's `accept` attribute.
    pub fn accept_attr(&self) -> String {
        self.accept.join(",")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Render corrected text and figure analysis as markup. When false the
    /// backend strings are escaped and shown as text.
    #[serde(default = "bool_true")]
    pub trust_backend_html: bool,
}

fn bool_true() -> bool { true }

impl Default for RenderConfig {
    fn default() -> Self {
        Self { trust_backend_html: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_view_cookie_name")]
    pub view_cookie_name: String,
    /// Set the Secure attribute; enable when served over HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_cookie_name()      -> String { "paperai_token".to_string() }
fn default_view_cookie_name() -> String { "paperai_view".to_string() }

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            view_cookie_name: default_view_cookie_name(),
            secure_cookies: false,
        }
    }
}


impl Config {
    /// Load configuration from paperai.toml, then apply env overrides.
    /// Checks PAPERAI_CONFIG env var first, then current directory.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "paperai.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|source| ConfigError::Io { path: path.clone(), source })?;
            info!(path = %path, "Loaded configuration");
            Self::from_toml_str(&content)?
        } else {
            info!(path = %path, "No config file found, using defaults");
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Environment wins over the file for the backend URL and bind address.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.backend.base_url = url;
        }
        if let Some(bind) = lookup(BIND_ENV).filter(|v| !v.trim().is_empty()) {
            self.server.bind = bind;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "backend.base_url must start with http:// or https://, got {url:?}"
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".to_string()));
        }
        if self.upload.edit_mode.trim().is_empty() {
            return Err(ConfigError::Invalid("upload.edit_mode must not be empty".to_string()));
        }
        if self.session.cookie_name == self.session.view_cookie_name {
            return Err(ConfigError::Invalid(
                "session.cookie_name and session.view_cookie_name must differ".to_string(),
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server.bind.parse().map_err(|e| {
            ConfigError::Invalid(format!("server.bind {:?} is not a socket address: {e}", self.server.bind))
        })
    }
}
