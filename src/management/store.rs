use std::sync::Arc;

use serde_json::{Value, json};

use crate::{
    error::{Result, TubifyError},
    management::storage::KeyValueStore,
    types::CredentialRecord,
};

pub const KEY_ACCESS_TOKEN: &str = "spotify_access_token";
pub const KEY_REFRESH_TOKEN: &str = "spotify_refresh_token";
pub const KEY_EXPIRES_IN: &str = "spotify_expires_in";
pub const KEY_OBTAINED_AT: &str = "spotify_obtained_at";
pub const KEY_CODE_VERIFIER: &str = "spotify_code_verifier";

/// Typed access to the credential record and the PKCE verifier slot.
#[derive(Clone)]
pub struct TokenStore {
    kv: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Returns `None` when no access token is stored.
    pub async fn load(&self) -> Result<Option<CredentialRecord>> {
        let Some(access_token) = self.get_string(KEY_ACCESS_TOKEN).await? else {
            return Ok(None);
        };

        let refresh_token = self.get_string(KEY_REFRESH_TOKEN).await?;
        let expires_in = self.get_u64(KEY_EXPIRES_IN).await?.unwrap_or(0);
        let obtained_at = self.get_i64(KEY_OBTAINED_AT).await?.unwrap_or(0);

        Ok(Some(CredentialRecord {
            access_token,
            refresh_token,
            expires_in,
            obtained_at,
        }))
    }

    /// Stores a complete record from a code exchange.
    pub async fn save(&self, record: &CredentialRecord) -> Result<()> {
        let mut entries = vec![
            (KEY_ACCESS_TOKEN.to_string(), json!(record.access_token)),
            (KEY_EXPIRES_IN.to_string(), json!(record.expires_in)),
            (KEY_OBTAINED_AT.to_string(), json!(record.obtained_at)),
        ];
        match &record.refresh_token {
            Some(refresh) => entries.push((KEY_REFRESH_TOKEN.to_string(), json!(refresh))),
            None => self.kv.remove(&[KEY_REFRESH_TOKEN]).await?,
        }
        self.kv.set(entries).await
    }

    /// Patches the record after a refresh.
    ///
    /// The stored refresh token is only replaced when the server rotated it.
    pub async fn save_refreshed(
        &self,
        access_token: &str,
        expires_in: u64,
        obtained_at: i64,
        refresh_token: Option<&str>,
    ) -> Result<()> {
        let mut entries = vec![
            (KEY_ACCESS_TOKEN.to_string(), json!(access_token)),
            (KEY_EXPIRES_IN.to_string(), json!(expires_in)),
            (KEY_OBTAINED_AT.to_string(), json!(obtained_at)),
        ];
        if let Some(refresh) = refresh_token {
            entries.push((KEY_REFRESH_TOKEN.to_string(), json!(refresh)));
        }
        self.kv.set(entries).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.kv
            .remove(&[
                KEY_ACCESS_TOKEN,
                KEY_REFRESH_TOKEN,
                KEY_EXPIRES_IN,
                KEY_OBTAINED_AT,
                KEY_CODE_VERIFIER,
            ])
            .await
    }

    /// Replaces whatever verifier was pending.
    pub async fn store_verifier(&self, verifier: &str) -> Result<()> {
        self.kv
            .set(vec![(KEY_CODE_VERIFIER.to_string(), json!(verifier))])
            .await
    }

    /// Reads the pending verifier and removes it, so it can be used once.
    pub async fn take_verifier(&self) -> Result<Option<String>> {
        let verifier = self.get_string(KEY_CODE_VERIFIER).await?;
        self.kv.remove(&[KEY_CODE_VERIFIER]).await?;
        Ok(verifier)
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.kv.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(unexpected(key, &other)),
        }
    }

    async fn get_u64(&self, key: &str) -> Result<Option<u64>> {
        match self.kv.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_u64().map(Some).ok_or_else(|| unexpected(key, &v)),
        }
    }

    async fn get_i64(&self, key: &str) -> Result<Option<i64>> {
        match self.kv.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| unexpected(key, &v)),
        }
    }
}

fn unexpected(key: &str, value: &Value) -> TubifyError {
    TubifyError::Storage(format!("unexpected value for {key}: {value}"))
}
