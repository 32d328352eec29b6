//! Configuration management for Tubify.
//!
//! This module handles loading configuration values from environment
//! variables and `.env` files. The configuration system follows a
//! hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults (where applicable)

use std::{env, path::PathBuf, time::Duration};

use url::Url;

use crate::error::{Result, TubifyError};

pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SCOPES: &[&str] = &[
    "playlist-read-private",
    "playlist-modify-public",
    "playlist-modify-private",
    "user-library-modify",
    "user-library-read",
];

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// Returns the application directory inside the platform data directory.
///
/// - Linux: `~/.local/share/tubify`
/// - macOS: `~/Library/Application Support/tubify`
/// - Windows: `%LOCALAPPDATA%/tubify`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("tubify");
    path
}

/// Loads environment variables from `tubify/.env` in the local data directory.
///
/// Creates the directory if it doesn't exist. A missing `.env` file is not an
/// error, the process environment alone may carry the configuration.
///
/// # Example
///
/// ```
/// use tubify::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<()> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir).await?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path)
            .map_err(|e| TubifyError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    }
    Ok(())
}

/// Runtime configuration for the Spotify client and the authorization flow.
#[derive(Debug, Clone)]
pub struct Config {
    /// Client id of the application registered with Spotify.
    pub client_id: String,
    /// Must match the registered redirect URI exactly, including the path.
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    /// Address the local redirect listener binds to.
    pub server_addr: String,
    pub http_timeout: Duration,
    pub max_retries: u32,
    /// First backoff delay; doubled on every further attempt.
    pub retry_base_delay: Duration,
    pub callback_timeout: Duration,
}

impl Config {
    /// Creates a configuration with Spotify's public endpoints and defaults.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            server_addr: "127.0.0.1:8888".to_string(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(500),
            callback_timeout: Duration::from_secs(DEFAULT_CALLBACK_TIMEOUT_SECS),
        }
    }

    /// Builds the configuration from the process environment.
    ///
    /// Only `SPOTIFY_API_AUTH_CLIENT_ID` is required. `SERVER_ADDRESS`
    /// defaults to the host and port of the redirect URI.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("SPOTIFY_API_AUTH_CLIENT_ID")
            .map_err(|_| TubifyError::Config("SPOTIFY_API_AUTH_CLIENT_ID must be set".into()))?;

        let mut config = Self::new(client_id);

        if let Some(uri) = var("SPOTIFY_API_REDIRECT_URI") {
            config.redirect_uri = uri;
        }
        if let Some(scope) = var("SPOTIFY_API_AUTH_SCOPE") {
            config.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
        if let Some(url) = var("SPOTIFY_API_AUTH_URL") {
            config.auth_url = url;
        }
        if let Some(url) = var("SPOTIFY_API_TOKEN_URL") {
            config.token_url = url;
        }
        if let Some(url) = var("SPOTIFY_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }

        config.server_addr = match var("SERVER_ADDRESS") {
            Some(addr) => addr,
            None => listen_addr_for(&config.redirect_uri)?,
        };

        if let Some(secs) = parse_var::<u64>("HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_var::<u32>("HTTP_MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(secs) = parse_var::<u64>("AUTH_CALLBACK_TIMEOUT_SECS")? {
            config.callback_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Scopes joined by spaces, as the authorize endpoint expects them.
    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Derives `host:port` from a redirect URI such as `http://127.0.0.1:8888/callback`.
pub fn listen_addr_for(redirect_uri: &str) -> Result<String> {
    let url = Url::parse(redirect_uri)
        .map_err(|e| TubifyError::Config(format!("invalid redirect uri {redirect_uri}: {e}")))?;
    let host = url
        .host_str()
        .ok_or_else(|| TubifyError::Config(format!("redirect uri {redirect_uri} has no host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| TubifyError::Config(format!("redirect uri {redirect_uri} has no port")))?;

    let host = if host == "localhost" { "127.0.0.1" } else { host };
    Ok(format!("{host}:{port}"))
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| TubifyError::Config(format!("{name} has an invalid value: {raw}"))),
        None => Ok(None),
    }
}
