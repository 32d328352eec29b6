//! Error types shared by the storage, Spotify and CLI layers.
//!
//! A search that finds nothing is not an error: the matcher returns
//! `Ok(None)` for that case.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TubifyError {
    /// No usable access token is stored, or it could not be refreshed.
    #[error("not logged in to Spotify, please run `tubify auth`")]
    AuthenticationRequired,

    /// The user cancelled or the authorization server returned an error.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed ({status}): {body}")]
    TokenExchangeFailed { status: StatusCode, body: String },

    /// Non-2xx answer from a Web API endpoint.
    #[error("Spotify request failed ({status}): {body}")]
    Api { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("timed out waiting for the Spotify authorization callback")]
    CallbackTimeout,

    #[error("a scan is already in progress")]
    Busy,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TubifyError {
    /// Whether repeating the same request may succeed.
    ///
    /// Transport failures, timeouts, 5xx and 429 are transient. Every other
    /// 4xx is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            TubifyError::Http(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            TubifyError::Api { status, .. } => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            _ => false,
        }
    }
}

/// A convenience Result alias that defaults to [`TubifyError`].
pub type Result<T> = std::result::Result<T, TubifyError>;
