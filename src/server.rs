use std::{
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{Extension, Router, routing::get};
use tokio::{sync::oneshot, task::JoinHandle};
use url::Url;

use crate::{
    api,
    error::{Result, TubifyError},
    types::CallbackParams,
    warning,
};

pub const HEALTH_PATH: &str = "/health";

/// One-shot delivery of the authorization redirect.
///
/// Whatever observes the browser (the local HTTP route, a pasted URL, an
/// extension) hands the redirect to [`RedirectListener::deliver_url`] or
/// [`RedirectListener::deliver`]. Only the first matching delivery reaches the
/// subscriber.
#[derive(Debug)]
pub struct RedirectListener {
    redirect: Url,
    sender: Mutex<Option<oneshot::Sender<CallbackParams>>>,
}

/// The receiving half handed to the authorization flow.
#[derive(Debug)]
pub struct RedirectSubscription {
    receiver: oneshot::Receiver<CallbackParams>,
}

impl RedirectListener {
    pub fn channel(redirect_uri: &str) -> Result<(Arc<Self>, RedirectSubscription)> {
        let redirect = Url::parse(redirect_uri).map_err(|e| {
            TubifyError::Config(format!("invalid redirect uri {redirect_uri}: {e}"))
        })?;
        check_route_path(redirect.path()).map_err(|reason| {
            TubifyError::Config(format!("redirect uri {redirect_uri} cannot be served: {reason}"))
        })?;
        let (sender, receiver) = oneshot::channel();

        let listener = Arc::new(Self {
            redirect,
            sender: Mutex::new(Some(sender)),
        });
        Ok((listener, RedirectSubscription { receiver }))
    }

    /// Path component of the registered redirect URI, e.g. `/callback`.
    pub fn path(&self) -> &str {
        self.redirect.path()
    }

    /// Same scheme, host, port and path as the registered redirect URI.
    pub fn matches(&self, url: &Url) -> bool {
        url.scheme() == self.redirect.scheme()
            && url.host_str() == self.redirect.host_str()
            && url.port_or_known_default() == self.redirect.port_or_known_default()
            && url.path() == self.redirect.path()
    }

    /// Returns `true` if this call delivered the redirect.
    pub fn deliver(&self, params: CallbackParams) -> bool {
        let sender = match self.sender.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        match sender {
            Some(sender) => sender.send(params).is_ok(),
            None => false,
        }
    }

    /// Delivers a full redirect URL if it matches the registered one.
    pub fn deliver_url(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        if !self.matches(&url) {
            return false;
        }

        let mut params = CallbackParams::default();
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                _ => {}
            }
        }
        self.deliver(params)
    }
}

impl RedirectSubscription {
    pub async fn wait(self, timeout: Duration) -> Result<CallbackParams> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(params)) => Ok(params),
            Ok(Err(_)) => Err(TubifyError::AuthorizationDenied(
                "redirect listener closed before the callback arrived".to_string(),
            )),
            Err(_) => Err(TubifyError::CallbackTimeout),
        }
    }
}

/// The redirect path shares the router with [`HEALTH_PATH`] and has to be a
/// literal axum route.
fn check_route_path(path: &str) -> std::result::Result<(), String> {
    if path.trim_end_matches('/') == HEALTH_PATH {
        return Err(format!("{HEALTH_PATH} is reserved for the health check"));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err("path segments must not start with `:` or `*`".to_string());
    }
    Ok(())
}

/// Local HTTP server receiving the browser redirect.
pub struct CallbackServer {
    addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CallbackServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stops accepting connections and waits for the server task.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(e) = self.handle.await {
            warning!("Callback server task failed: {}", e);
        }
    }
}

pub async fn start_callback_server(
    addr: &str,
    listener: Arc<RedirectListener>,
) -> Result<CallbackServer> {
    let addr = SocketAddr::from_str(addr)
        .map_err(|e| TubifyError::Config(format!("failed to parse server address {addr}: {e}")))?;

    let app = Router::new()
        .route(HEALTH_PATH, get(api::health))
        .route(
            listener.path(),
            get(api::callback).layer(Extension(Arc::clone(&listener))),
        );

    let tcp = tokio::net::TcpListener::bind(&addr).await?;
    let addr = tcp.local_addr()?;

    let (shutdown, signal) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let result = axum::serve(tcp, app)
            .with_graceful_shutdown(async move {
                let _ = signal.await;
            })
            .await;
        if let Err(e) = result {
            warning!("Callback server stopped: {}", e);
        }
    });

    Ok(CallbackServer {
        addr,
        shutdown,
        handle,
    })
}
