use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use reqwest::Client;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    error::{Result, TubifyError},
    management::store::TokenStore,
    spotify,
    types::CredentialRecord,
    utils::{Clock, SystemClock},
    warning,
};

/// Where the stored credential record stands right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    Absent,
    Valid,
    ExpiredRefreshable,
    ExpiredUnrefreshable,
}

#[derive(Debug, Default)]
struct RefreshOutcome {
    epoch: u64,
    access_token: Option<String>,
}

/// Owns the credential record and hands out usable access tokens.
///
/// Every Spotify call goes through [`TokenManager::require_token`]. An expired
/// token is refreshed at most once even when several callers notice the
/// expiry at the same time: the first caller performs the exchange and the
/// ones queued behind it reuse its outcome.
pub struct TokenManager {
    store: TokenStore,
    config: Config,
    http: Client,
    clock: Arc<dyn Clock>,
    refresh_gate: Mutex<RefreshOutcome>,
    refresh_epoch: AtomicU64,
}

impl TokenManager {
    pub fn new(store: TokenStore, config: Config, http: Client) -> Self {
        Self::with_clock(store, config, http, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: TokenStore,
        config: Config,
        http: Client,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            config,
            http,
            clock,
            refresh_gate: Mutex::new(RefreshOutcome::default()),
            refresh_epoch: AtomicU64::new(0),
        }
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub async fn state(&self) -> Result<TokenState> {
        let Some(record) = self.store.load().await? else {
            return Ok(TokenState::Absent);
        };
        Ok(self.classify(&record))
    }

    pub async fn credentials(&self) -> Result<Option<CredentialRecord>> {
        self.store.load().await
    }

    /// Returns a currently usable access token, refreshing it if needed.
    ///
    /// `Ok(None)` means there is no token, or the refresh failed. A failed
    /// refresh leaves the stored record untouched so a later call can retry.
    pub async fn get_valid_token(&self) -> Result<Option<String>> {
        let seen_epoch = self.refresh_epoch.load(Ordering::Acquire);

        let Some(record) = self.store.load().await? else {
            return Ok(None);
        };

        match self.classify(&record) {
            TokenState::Valid => Ok(Some(record.access_token)),
            TokenState::ExpiredRefreshable => self.refresh_once(seen_epoch).await,
            TokenState::Absent | TokenState::ExpiredUnrefreshable => Ok(None),
        }
    }

    /// Like [`get_valid_token`](Self::get_valid_token) but fails fast without a token.
    pub async fn require_token(&self) -> Result<String> {
        self.get_valid_token()
            .await?
            .ok_or(TubifyError::AuthenticationRequired)
    }

    /// Stores the record obtained from an authorization code exchange.
    pub async fn save_credentials(&self, record: &CredentialRecord) -> Result<()> {
        self.store.save(record).await
    }

    pub async fn store_verifier(&self, verifier: &str) -> Result<()> {
        self.store.store_verifier(verifier).await
    }

    pub async fn take_verifier(&self) -> Result<Option<String>> {
        self.store.take_verifier().await
    }

    /// Forgets the credential record and any pending verifier.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await
    }

    fn classify(&self, record: &CredentialRecord) -> TokenState {
        if record.is_usable_at(self.clock.now_millis()) {
            TokenState::Valid
        } else if record.refresh_token.is_some() {
            TokenState::ExpiredRefreshable
        } else {
            TokenState::ExpiredUnrefreshable
        }
    }

    async fn refresh_once(&self, seen_epoch: u64) -> Result<Option<String>> {
        let mut gate = self.refresh_gate.lock().await;

        // Another caller refreshed while we were waiting for the gate.
        if gate.epoch != seen_epoch {
            return Ok(gate.access_token.clone());
        }

        let outcome = match self.store.load().await? {
            Some(record) if record.is_usable_at(self.clock.now_millis()) => {
                Some(record.access_token)
            }
            Some(CredentialRecord {
                refresh_token: Some(refresh_token),
                ..
            }) => self.refresh(&refresh_token).await?,
            _ => None,
        };

        gate.epoch += 1;
        gate.access_token = outcome.clone();
        self.refresh_epoch.store(gate.epoch, Ordering::Release);

        Ok(outcome)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Option<String>> {
        let response =
            match spotify::auth::refresh_token(&self.http, &self.config, refresh_token).await {
                Ok(response) => response,
                Err(e) => {
                    warning!("Failed to refresh Spotify token: {}", e);
                    return Ok(None);
                }
            };

        self.store
            .save_refreshed(
                &response.access_token,
                response.expires_in,
                self.clock.now_millis(),
                response.refresh_token.as_deref(),
            )
            .await?;

        Ok(Some(response.access_token))
    }
}
