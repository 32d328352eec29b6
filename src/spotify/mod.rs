//! # Spotify Integration Module
//!
//! This module talks to Spotify: the accounts service for the OAuth 2.0 PKCE
//! flow and the Web API for search, playlists and the saved-tracks library.
//!
//! ## Architecture
//!
//! ```text
//! CLI / ScanSession
//!          ↓
//! SpotifyClient ── TokenManager (valid token or AuthenticationRequired)
//!     ├── search    (Track Matcher)
//!     ├── playlist  (Playlist Mutator)
//!     └── user      (profile)
//! auth (authorize URL, code + refresh exchange, redirect handling)
//!          ↓
//! reqwest (bounded timeout)
//! ```
//!
//! ## Retries
//!
//! Web API requests are retried with exponential backoff when the failure is
//! transient: transport errors, timeouts and 5xx answers. `429 Too Many
//! Requests` waits for `Retry-After` when it is reasonable. Any other 4xx is
//! returned immediately. Token endpoint calls are never retried.

pub mod auth;
pub mod playlist;
pub mod search;
pub mod user;

use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, Response, StatusCode, header::RETRY_AFTER};
use tokio::time::sleep;

use crate::{
    config::Config,
    error::{Result, TubifyError},
    management::TokenManager,
    warning,
};

/// Longest `Retry-After` we are willing to sit through.
const MAX_RETRY_AFTER_SECS: u64 = 120;

/// Builds the shared HTTP client with the configured request timeout.
pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

pub struct SpotifyClient {
    http: Client,
    config: Config,
    tokens: Arc<TokenManager>,
}

impl SpotifyClient {
    pub fn new(config: Config, tokens: Arc<TokenManager>) -> Result<Self> {
        let http = http_client(&config)?;
        Ok(Self::with_http(config, tokens, http))
    }

    pub fn with_http(config: Config, tokens: Arc<TokenManager>, http: Client) -> Self {
        Self {
            http,
            config,
            tokens,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    /// Sends a bearer-authenticated request built by `build`.
    ///
    /// A valid token is fetched before every attempt, so a retry after a long
    /// backoff never goes out with a token that expired meanwhile.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client, &str) -> RequestBuilder,
    {
        let mut attempt: u32 = 0;

        loop {
            let token = self.tokens.require_token().await?;

            let err = match build(&self.http, &token).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) => {
                    let status = resp.status();
                    let retry_after = retry_after_secs(&resp);
                    let body = resp.text().await.unwrap_or_default();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if let Some(secs) = retry_after {
                            if secs > MAX_RETRY_AFTER_SECS {
                                warning!(
                                    "Spotify asks to retry after {} seconds. Try again later.",
                                    secs
                                );
                                return Err(TubifyError::Api { status, body });
                            }
                            if attempt < self.config.max_retries {
                                attempt += 1;
                                sleep(Duration::from_secs(secs)).await;
                                continue;
                            }
                        }
                    }

                    TubifyError::Api { status, body }
                }
                Err(e) => TubifyError::Http(e),
            };

            if !err.is_retryable() || attempt >= self.config.max_retries {
                return Err(err);
            }

            let delay = self.backoff(attempt);
            warning!("{}; retrying in {} ms", err, delay.as_millis());
            sleep(delay).await;
            attempt += 1;
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.config
            .retry_base_delay
            .saturating_mul(1u32 << attempt.min(6))
    }
}

fn retry_after_secs(resp: &Response) -> Option<u64> {
    resp.headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
}
