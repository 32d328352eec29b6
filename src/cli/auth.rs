use std::sync::Arc;

use crate::{cli::Context, error, info, spotify::auth::AuthorizationFlow, success, warning};

pub async fn auth() {
    let ctx = Context::load();
    let flow = AuthorizationFlow::new(
        ctx.config.clone(),
        Arc::clone(&ctx.tokens),
        ctx.http.clone(),
    );

    info!(
        "Waiting for Spotify to redirect to {} ...",
        ctx.config.redirect_uri
    );

    match flow.authorize().await {
        Ok(Some(record)) => {
            if record.refresh_token.is_none() {
                warning!(
                    "Spotify did not return a refresh token; log in again when it expires."
                );
            }
            success!("Authentication successful!");
        }
        Ok(None) => warning!("Authorization was cancelled."),
        Err(e) => error!("Authentication failed. Err: {}", e),
    }
}

pub async fn logout() {
    let ctx = Context::load();
    match ctx.tokens.logout().await {
        Ok(()) => success!("Stored Spotify credentials removed."),
        Err(e) => error!("Failed to remove credentials. Err: {}", e),
    }
}
