// ABOUTME: Configuration loading and validation for the postview server.
// ABOUTME: Reads POSTVIEW_* and GEMINI_* environment variables and enforces security constraints.

use std::net::SocketAddr;
use std::path::PathBuf;

use postview_agent::gemini::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use thiserror::Error;

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("POSTVIEW_BIND is not a valid socket address: {0}")]
    InvalidBind(String),

    #[error("POSTVIEW_ALLOW_REMOTE is true but POSTVIEW_AUTH_TOKEN is not set; refusing to start without authentication")]
    RemoteWithoutToken,

    #[error("POSTVIEW_STORE must be \"sqlite\" or \"http\", got {0:?}")]
    InvalidStore(String),

    #[error("POSTVIEW_STORE is http but POSTVIEW_API_URL is not set")]
    MissingApiUrl,
}

/// Where posts are read from and deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreKind {
    Sqlite,
    Http,
}

/// Server configuration loaded from environment variables.
#[derive(Clone)]
pub struct PostviewConfig {
    pub bind: SocketAddr,
    pub allow_remote: bool,
    pub auth_token: Option<String>,
    /// Explicit public URL for share links; see [`PostviewConfig::base_url`].
    pub public_base_url: Option<String>,
    pub store: StoreKind,
    pub db_path: PathBuf,
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
}

// Secrets stay out of logs.
impl std::fmt::Debug for PostviewConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostviewConfig")
            .field("bind", &self.bind)
            .field("allow_remote", &self.allow_remote)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("public_base_url", &self.public_base_url)
            .field("store", &self.store)
            .field("db_path", &self.db_path)
            .field("api_url", &self.api_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .finish()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl PostviewConfig {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// Environment variables:
    /// - POSTVIEW_BIND: socket address to bind (default: 127.0.0.1:7340)
    /// - POSTVIEW_ALLOW_REMOTE: allow non-loopback connections (default: false)
    /// - POSTVIEW_AUTH_TOKEN: token that marks a viewer as authenticated (optional)
    /// - POSTVIEW_PUBLIC_BASE_URL: public URL for share links (default: http://{bind})
    /// - POSTVIEW_STORE: `sqlite` (default) or `http`
    /// - POSTVIEW_DB: SQLite database path (default: ~/.postview/posts.db)
    /// - POSTVIEW_API_URL: remote blog API base URL, required for the http store
    /// - POSTVIEW_API_TOKEN: bearer token sent to the remote blog API (optional)
    /// - GEMINI_API_KEY, GEMINI_MODEL, GEMINI_BASE_URL: summarizer backend
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_str = std::env::var("POSTVIEW_BIND").unwrap_or_else(|_| "127.0.0.1:7340".to_string());
        let bind: SocketAddr = bind_str
            .parse()
            .map_err(|_| ConfigError::InvalidBind(bind_str))?;

        let allow_remote = std::env::var("POSTVIEW_ALLOW_REMOTE")
            .map(|v| v == "true" || v == "1" || v == "yes")
            .unwrap_or(false);

        let auth_token = non_empty_var("POSTVIEW_AUTH_TOKEN");

        let public_base_url = non_empty_var("POSTVIEW_PUBLIC_BASE_URL");

        let store = match std::env::var("POSTVIEW_STORE").as_deref() {
            Err(_) | Ok("") | Ok("sqlite") => StoreKind::Sqlite,
            Ok("http") => StoreKind::Http,
            Ok(other) => return Err(ConfigError::InvalidStore(other.to_string())),
        };

        let db_path = std::env::var("POSTVIEW_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::var("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("/tmp"))
                    .join(".postview")
                    .join("posts.db")
            });

        let api_url = non_empty_var("POSTVIEW_API_URL");

        // Security validation: if allowing remote access, require auth token
        if allow_remote && auth_token.is_none() {
            return Err(ConfigError::RemoteWithoutToken);
        }

        if store == StoreKind::Http && api_url.is_none() {
            return Err(ConfigError::MissingApiUrl);
        }

        Ok(Self {
            bind,
            allow_remote,
            auth_token,
            public_base_url,
            store,
            db_path,
            api_url,
            api_token: non_empty_var("POSTVIEW_API_TOKEN"),
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            gemini_model: non_empty_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: non_empty_var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Public URL that share links are built on, without a trailing slash.
    /// Falls back to the current bind address so CLI overrides are honored.
    pub fn base_url(&self) -> String {
        self.public_base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}", self.bind))
            .trim_end_matches('/')
            .to_string()
    }
}
