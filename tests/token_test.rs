use std::{sync::Arc, time::Duration};

use serde_json::json;
use tubify::{
    config::Config,
    error::TubifyError,
    management::{KeyValueStore, MemoryStore, TokenManager, TokenState, TokenStore},
    types::CredentialRecord,
    utils::{Clock, ManualClock},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

const OBTAINED_AT: i64 = 1_700_000_000_000;
const EXPIRES_IN: i64 = 3600;

struct Fixture {
    manager: Arc<TokenManager>,
    store: TokenStore,
    clock: Arc<ManualClock>,
}

fn fixture(server: &MockServer) -> Fixture {
    let mut config = Config::new("test-client");
    config.token_url = format!("{}/api/token", server.uri());

    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let store = TokenStore::new(kv);
    let clock = Arc::new(ManualClock::new(OBTAINED_AT));

    let manager = TokenManager::with_clock(
        store.clone(),
        config,
        reqwest::Client::new(),
        clock.clone(),
    );

    Fixture {
        manager: Arc::new(manager),
        store,
        clock,
    }
}

fn record(refresh_token: Option<&str>) -> CredentialRecord {
    CredentialRecord {
        access_token: "access-1".to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_in: EXPIRES_IN as u64,
        obtained_at: OBTAINED_AT,
    }
}

fn refreshed_body(refresh_token: Option<&str>) -> serde_json::Value {
    let mut body = json!({
        "access_token": "access-2",
        "token_type": "Bearer",
        "expires_in": 3600,
    });
    if let Some(refresh) = refresh_token {
        body["refresh_token"] = json!(refresh);
    }
    body
}

#[tokio::test]
async fn test_token_is_used_until_safety_margin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body(None)))
        .expect(0)
        .mount(&server)
        .await;

    let f = fixture(&server);
    f.store.save(&record(Some("refresh-1"))).await.unwrap();

    f.clock.advance_secs(EXPIRES_IN - 61);

    assert_eq!(f.manager.state().await.unwrap(), TokenState::Valid);
    let token = f.manager.get_valid_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("access-1"));
}

#[tokio::test]
async fn test_token_refreshes_inside_safety_margin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=test-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body(None)))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server);
    f.store.save(&record(Some("refresh-1"))).await.unwrap();

    f.clock.advance_secs(EXPIRES_IN - 59);
    assert_eq!(f.manager.state().await.unwrap(), TokenState::ExpiredRefreshable);

    let token = f.manager.get_valid_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("access-2"));

    let stored = f.store.load().await.unwrap().unwrap();
    assert_eq!(stored.access_token, "access-2");
    assert_eq!(stored.expires_in, 3600);
    assert_eq!(stored.obtained_at, f.clock.now_millis());
    // No refresh token in the response keeps the old one
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));

    // The new token is valid, no second refresh happens
    assert_eq!(f.manager.state().await.unwrap(), TokenState::Valid);
    let again = f.manager.get_valid_token().await.unwrap();
    assert_eq!(again.as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_rotated_refresh_token_replaces_stored_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body(Some("refresh-2"))))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server);
    f.store.save(&record(Some("refresh-1"))).await.unwrap();
    f.clock.advance_secs(EXPIRES_IN);

    let token = f.manager.get_valid_token().await.unwrap();
    assert_eq!(token.as_deref(), Some("access-2"));

    let stored = f.store.load().await.unwrap().unwrap();
    assert_eq!(stored.refresh_token.as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_failed_refresh_leaves_record_untouched() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh token revoked",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server);
    let original = record(Some("refresh-1"));
    f.store.save(&original).await.unwrap();
    f.clock.advance_secs(EXPIRES_IN);

    let token = f.manager.get_valid_token().await.unwrap();
    assert_eq!(token, None);

    let stored = f.store.load().await.unwrap().unwrap();
    assert_eq!(stored, original);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(refreshed_body(None))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let f = fixture(&server);
    f.store.save(&record(Some("refresh-1"))).await.unwrap();
    f.clock.advance_secs(EXPIRES_IN);

    let first = Arc::clone(&f.manager);
    let second = Arc::clone(&f.manager);
    let (a, b) = tokio::join!(first.get_valid_token(), second.get_valid_token());

    assert_eq!(a.unwrap().as_deref(), Some("access-2"));
    assert_eq!(b.unwrap().as_deref(), Some("access-2"));
}

#[tokio::test]
async fn test_absent_record() {
    let server = MockServer::start().await;
    let f = fixture(&server);

    assert_eq!(f.manager.state().await.unwrap(), TokenState::Absent);
    assert_eq!(f.manager.get_valid_token().await.unwrap(), None);
    assert!(matches!(
        f.manager.require_token().await,
        Err(TubifyError::AuthenticationRequired)
    ));
}

#[tokio::test]
async fn test_expired_without_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed_body(None)))
        .expect(0)
        .mount(&server)
        .await;

    let f = fixture(&server);
    f.store.save(&record(None)).await.unwrap();
    f.clock.advance_secs(EXPIRES_IN);

    assert_eq!(f.manager.state().await.unwrap(), TokenState::ExpiredUnrefreshable);
    assert_eq!(f.manager.get_valid_token().await.unwrap(), None);

    let err = f.manager.require_token().await.unwrap_err();
    assert!(err.to_string().contains("tubify auth"));
}

#[tokio::test]
async fn test_logout_forgets_everything() {
    let server = MockServer::start().await;
    let f = fixture(&server);

    f.store.save(&record(Some("refresh-1"))).await.unwrap();
    f.manager.store_verifier("verifier").await.unwrap();

    f.manager.logout().await.unwrap();

    assert_eq!(f.manager.state().await.unwrap(), TokenState::Absent);
    assert_eq!(f.manager.take_verifier().await.unwrap(), None);
}
