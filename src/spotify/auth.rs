use std::sync::Arc;

use reqwest::Client;
use url::Url;

use crate::{
    config::Config,
    error::{Result, TubifyError},
    info,
    management::TokenManager,
    server::{self, RedirectListener},
    types::{CallbackParams, CredentialRecord, TokenResponse},
    utils, warning,
};

/// Everything the browser needs to start authorization.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    /// Anti-forgery value the callback has to echo back.
    pub state: String,
}

/// Builds the `/authorize` URL for the Authorization Code flow with PKCE.
pub fn authorize_url(config: &Config, code_challenge: &str, state: &str) -> Result<String> {
    let scope = config.scope();
    let url = Url::parse_with_params(
        &config.auth_url,
        &[
            ("client_id", config.client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("code_challenge_method", "S256"),
            ("code_challenge", code_challenge),
            ("scope", scope.as_str()),
            ("state", state),
        ],
    )
    .map_err(|e| TubifyError::Config(format!("invalid auth url {}: {}", config.auth_url, e)))?;

    Ok(url.into())
}

/// Exchanges an authorization code and its PKCE verifier for tokens.
pub async fn exchange_code_pkce(
    http: &Client,
    config: &Config,
    code: &str,
    verifier: &str,
) -> Result<TokenResponse> {
    token_request(
        http,
        config,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_uri.as_str()),
            ("client_id", config.client_id.as_str()),
            ("code_verifier", verifier),
        ],
    )
    .await
}

/// Exchanges a refresh token for a new access token.
///
/// Spotify may or may not rotate the refresh token; the response carries a
/// new one only when it did.
pub async fn refresh_token(
    http: &Client,
    config: &Config,
    refresh_token: &str,
) -> Result<TokenResponse> {
    token_request(
        http,
        config,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", config.client_id.as_str()),
        ],
    )
    .await
}

async fn token_request(
    http: &Client,
    config: &Config,
    form: &[(&str, &str)],
) -> Result<TokenResponse> {
    let res = http.post(&config.token_url).form(form).send().await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        warning!("Token endpoint answered {}: {}", status, body);
        return Err(TubifyError::TokenExchangeFailed { status, body });
    }

    Ok(res.json::<TokenResponse>().await?)
}

/// Drives the Authorization Code + PKCE flow.
pub struct AuthorizationFlow {
    config: Config,
    tokens: Arc<TokenManager>,
    http: Client,
}

impl AuthorizationFlow {
    pub fn new(config: Config, tokens: Arc<TokenManager>, http: Client) -> Self {
        Self {
            config,
            tokens,
            http,
        }
    }

    /// Generates a PKCE pair, parks the verifier and builds the authorize URL.
    pub async fn begin(&self) -> Result<AuthorizationRequest> {
        let pkce = utils::generate_pkce_pair();
        self.tokens.store_verifier(&pkce.code_verifier).await?;

        let state = utils::generate_state();
        let url = authorize_url(&self.config, &pkce.code_challenge, &state)?;

        Ok(AuthorizationRequest { url, state })
    }

    /// Handles the redirect back from Spotify.
    ///
    /// Returns `Ok(None)` when the redirect carries neither a code nor an
    /// error, which is how a cancelled login looks. The pending verifier is
    /// consumed on every path.
    pub async fn complete(
        &self,
        params: CallbackParams,
        expected_state: &str,
    ) -> Result<Option<CredentialRecord>> {
        let verifier = self.tokens.take_verifier().await?;

        if let Some(error) = params.error {
            warning!("Spotify authorization returned an error: {}", error);
            return Err(TubifyError::AuthorizationDenied(error));
        }

        let Some(code) = params.code else {
            return Ok(None);
        };

        if params.state.as_deref() != Some(expected_state) {
            return Err(TubifyError::AuthorizationDenied(
                "state mismatch in authorization callback".to_string(),
            ));
        }

        let Some(verifier) = verifier else {
            return Err(TubifyError::Config(
                "no PKCE code verifier pending, start the authorization again".to_string(),
            ));
        };

        let response = exchange_code_pkce(&self.http, &self.config, &code, &verifier).await?;
        let record = CredentialRecord {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_in: response.expires_in,
            obtained_at: self.tokens.now_millis(),
        };
        self.tokens.save_credentials(&record).await?;

        Ok(Some(record))
    }

    /// Runs the whole flow: browser, local redirect listener, code exchange.
    ///
    /// The listener is bound before a verifier is stored, so a port that is
    /// already taken leaves no verifier behind.
    pub async fn authorize(&self) -> Result<Option<CredentialRecord>> {
        let (listener, subscription) = RedirectListener::channel(&self.config.redirect_uri)?;
        let callback_server =
            server::start_callback_server(&self.config.server_addr, listener).await?;

        let request = match self.begin().await {
            Ok(request) => request,
            Err(e) => {
                callback_server.shutdown().await;
                return Err(e);
            }
        };

        info!("Opening Spotify authorization in your browser...");
        if webbrowser::open(&request.url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                request.url
            )
        }

        let params = subscription.wait(self.config.callback_timeout).await;
        callback_server.shutdown().await;

        match params {
            Ok(params) => self.complete(params, &request.state).await,
            Err(e) => {
                self.tokens.take_verifier().await?;
                Err(e)
            }
        }
    }
}
