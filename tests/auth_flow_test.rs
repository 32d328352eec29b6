use std::{collections::HashMap, sync::Arc, time::Duration};

use serde_json::json;
use tubify::{
    config::Config,
    error::TubifyError,
    management::{KeyValueStore, MemoryStore, TokenManager, TokenStore},
    server::{RedirectListener, start_callback_server},
    spotify::auth::{AuthorizationFlow, authorize_url},
    types::CallbackParams,
    utils::{ManualClock, generate_code_challenge},
};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const NOW: i64 = 1_700_000_000_000;
const REDIRECT_URI: &str = "http://127.0.0.1:8888/callback";

struct Fixture {
    flow: AuthorizationFlow,
    tokens: Arc<TokenManager>,
    store: TokenStore,
}

fn test_config(server: &MockServer) -> Config {
    let mut config = Config::new("test-client");
    config.token_url = format!("{}/api/token", server.uri());
    config.auth_url = "https://accounts.example.com/authorize".to_string();
    config.redirect_uri = REDIRECT_URI.to_string();
    config
}

fn fixture(server: &MockServer) -> Fixture {
    let config = test_config(server);
    let http = reqwest::Client::new();

    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let store = TokenStore::new(kv);
    let tokens = Arc::new(TokenManager::with_clock(
        store.clone(),
        config.clone(),
        http.clone(),
        Arc::new(ManualClock::new(NOW)),
    ));

    Fixture {
        flow: AuthorizationFlow::new(config, Arc::clone(&tokens), http),
        tokens,
        store,
    }
}

fn callback(code: Option<&str>, state: Option<&str>, error: Option<&str>) -> CallbackParams {
    CallbackParams {
        code: code.map(str::to_string),
        state: state.map(str::to_string),
        error: error.map(str::to_string),
    }
}

async fn mount_token_endpoint(server: &MockServer, status: u16, expected_calls: u64) {
    let response = if status == 200 {
        ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "Bearer",
            "scope": "user-library-modify",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
        }))
    } else {
        ResponseTemplate::new(status).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid authorization code",
        }))
    };

    Mock::given(method("POST"))
        .and(path("/api/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_complete_exchanges_code_with_stored_verifier() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 1).await;

    let f = fixture(&server);
    f.tokens.store_verifier("stored-verifier").await.unwrap();

    let record = f
        .flow
        .complete(callback(Some("abc"), Some("xyz"), None), "xyz")
        .await
        .unwrap()
        .expect("a credential record");

    assert_eq!(record.access_token, "access-1");
    assert_eq!(record.refresh_token.as_deref(), Some("refresh-1"));
    assert_eq!(record.expires_in, 3600);
    assert_eq!(record.obtained_at, NOW);

    // Exactly these form fields, nothing more
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let form: HashMap<String, String> = url::form_urlencoded::parse(&requests[0].body)
        .into_owned()
        .collect();
    let expected: HashMap<String, String> = [
        ("grant_type", "authorization_code"),
        ("code", "abc"),
        ("redirect_uri", REDIRECT_URI),
        ("client_id", "test-client"),
        ("code_verifier", "stored-verifier"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    assert_eq!(form, expected);

    // The record is persisted and the verifier is gone
    assert_eq!(f.store.load().await.unwrap(), Some(record));
    assert_eq!(f.tokens.take_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_complete_with_error_is_denied() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let f = fixture(&server);
    f.tokens.store_verifier("stored-verifier").await.unwrap();

    let result = f
        .flow
        .complete(callback(None, Some("xyz"), Some("access_denied")), "xyz")
        .await;

    match result {
        Err(TubifyError::AuthorizationDenied(reason)) => assert_eq!(reason, "access_denied"),
        other => panic!("expected AuthorizationDenied, got {:?}", other),
    }
    assert_eq!(f.store.load().await.unwrap(), None);
    assert_eq!(f.tokens.take_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_complete_without_code_is_a_no_op() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let f = fixture(&server);
    f.tokens.store_verifier("stored-verifier").await.unwrap();

    let result = f.flow.complete(callback(None, None, None), "xyz").await.unwrap();

    assert_eq!(result, None);
    assert_eq!(f.store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_complete_rejects_state_mismatch() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let f = fixture(&server);
    f.tokens.store_verifier("stored-verifier").await.unwrap();

    let result = f
        .flow
        .complete(callback(Some("abc"), Some("forged"), None), "xyz")
        .await;
    assert!(matches!(result, Err(TubifyError::AuthorizationDenied(_))));

    let missing_state = f.flow.complete(callback(Some("abc"), None, None), "xyz").await;
    assert!(matches!(missing_state, Err(TubifyError::AuthorizationDenied(_))));
}

#[tokio::test]
async fn test_complete_without_pending_verifier() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let f = fixture(&server);

    let result = f
        .flow
        .complete(callback(Some("abc"), Some("xyz"), None), "xyz")
        .await;
    assert!(matches!(result, Err(TubifyError::Config(_))));
}

#[tokio::test]
async fn test_complete_surfaces_token_endpoint_failure() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 400, 1).await;

    let f = fixture(&server);
    f.tokens.store_verifier("stored-verifier").await.unwrap();

    let result = f
        .flow
        .complete(callback(Some("abc"), Some("xyz"), None), "xyz")
        .await;

    match result {
        Err(TubifyError::TokenExchangeFailed { status, body }) => {
            assert_eq!(status.as_u16(), 400);
            assert!(body.contains("invalid_grant"));
        }
        other => panic!("expected TokenExchangeFailed, got {:?}", other),
    }
    assert_eq!(f.store.load().await.unwrap(), None);
}

#[tokio::test]
async fn test_begin_builds_authorize_url_and_parks_verifier() {
    let server = MockServer::start().await;
    let f = fixture(&server);

    let request = f.flow.begin().await.unwrap();
    let url = Url::parse(&request.url).unwrap();
    let params: HashMap<String, String> = url.query_pairs().into_owned().collect();

    assert_eq!(url.host_str(), Some("accounts.example.com"));
    assert_eq!(url.path(), "/authorize");
    assert_eq!(params["client_id"], "test-client");
    assert_eq!(params["response_type"], "code");
    assert_eq!(params["redirect_uri"], REDIRECT_URI);
    assert_eq!(params["code_challenge_method"], "S256");
    assert_eq!(params["state"], request.state);
    assert!(params["scope"].contains("playlist-modify-private"));

    // The challenge belongs to the verifier that was stored
    let verifier = f.tokens.take_verifier().await.unwrap().expect("stored verifier");
    assert_eq!(verifier.len(), 64);
    assert_eq!(params["code_challenge"], generate_code_challenge(&verifier));
}

#[test]
fn test_authorize_url_encodes_scope_with_spaces() {
    let mut config = Config::new("client");
    config.scopes = vec!["user-library-read".to_string(), "user-library-modify".to_string()];

    let url = authorize_url(&config, "challenge", "state").unwrap();
    let parsed = Url::parse(&url).unwrap();
    let scope = parsed
        .query_pairs()
        .find(|(k, _)| k == "scope")
        .map(|(_, v)| v.into_owned());

    assert_eq!(scope.as_deref(), Some("user-library-read user-library-modify"));
}

#[tokio::test]
async fn test_callback_server_delivers_redirect() {
    let (listener, subscription) = RedirectListener::channel(REDIRECT_URI).unwrap();
    let server = start_callback_server("127.0.0.1:0", listener).await.unwrap();
    let base = format!("http://{}", server.local_addr());

    let http = reqwest::Client::new();

    let health = http.get(format!("{}/health", base)).send().await.unwrap();
    assert!(health.status().is_success());
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body["status"], "ok");

    let page = http
        .get(format!("{}/callback?code=abc&state=xyz", base))
        .send()
        .await
        .unwrap();
    assert!(page.status().is_success());
    assert!(page.text().await.unwrap().contains("window.close()"));

    let params = subscription.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(params, callback(Some("abc"), Some("xyz"), None));

    server.shutdown().await;
}

#[tokio::test]
async fn test_callback_server_passes_errors_through() {
    let (listener, subscription) = RedirectListener::channel(REDIRECT_URI).unwrap();
    let server = start_callback_server("127.0.0.1:0", listener).await.unwrap();

    reqwest::get(format!(
        "http://{}/callback?error=access_denied&state=xyz",
        server.local_addr()
    ))
    .await
    .unwrap();

    let params = subscription.wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(params.error.as_deref(), Some("access_denied"));
    assert_eq!(params.code, None);

    server.shutdown().await;
}

#[tokio::test]
async fn test_authorize_on_busy_port_leaves_no_verifier() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();

    let mut config = test_config(&server);
    config.server_addr = occupied.local_addr().unwrap().to_string();
    config.callback_timeout = Duration::from_millis(50);

    let f = fixture(&server);
    let flow = AuthorizationFlow::new(config, Arc::clone(&f.tokens), reqwest::Client::new());

    let result = flow.authorize().await;

    assert!(matches!(result, Err(TubifyError::Io(_))));
    assert_eq!(f.tokens.take_verifier().await.unwrap(), None);
}

#[tokio::test]
async fn test_authorize_with_reserved_redirect_path_leaves_no_verifier() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, 200, 0).await;

    let mut config = test_config(&server);
    config.redirect_uri = "http://127.0.0.1:8888/health".to_string();
    config.server_addr = "127.0.0.1:0".to_string();

    let f = fixture(&server);
    let flow = AuthorizationFlow::new(config, Arc::clone(&f.tokens), reqwest::Client::new());

    let result = flow.authorize().await;

    assert!(matches!(result, Err(TubifyError::Config(_))));
    assert_eq!(f.tokens.take_verifier().await.unwrap(), None);
}
