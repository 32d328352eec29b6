use chrono::{DateTime, Local, Utc};
use colored::Colorize;

use crate::{cli::Context, error, info, management::TokenState, success, warning};

pub async fn status() {
    let ctx = Context::load();

    let state = match ctx.tokens.state().await {
        Ok(state) => state,
        Err(e) => error!("Cannot read stored credentials. Err: {}", e),
    };

    match state {
        TokenState::Absent => warning!("Not logged in. Run tubify auth."),
        TokenState::Valid => success!("Logged in, access token is valid."),
        TokenState::ExpiredRefreshable => {
            info!("Access token expired, it will be refreshed on the next request.")
        }
        TokenState::ExpiredUnrefreshable => {
            warning!("Access token expired and cannot be refreshed. Run tubify auth.")
        }
    }

    if let Ok(Some(record)) = ctx.tokens.credentials().await {
        if let Some(until) = DateTime::<Utc>::from_timestamp_millis(record.usable_until()) {
            println!(
                "{} {}",
                "Usable until:".bold(),
                until.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
            );
        }
        println!(
            "{} {}",
            "Refresh token:".bold(),
            if record.refresh_token.is_some() { "yes" } else { "no" }
        );
    }
}

pub async fn whoami() {
    let ctx = Context::load();

    match ctx.client.current_user().await {
        Ok(user) => {
            println!("{} {}", "Id:".bold(), user.id);
            if let Some(name) = user.display_name {
                println!("{} {}", "Name:".bold(), name);
            }
            if let Some(email) = user.email {
                println!("{} {}", "Email:".bold(), email);
            }
            if let Some(product) = user.product {
                println!("{} {}", "Product:".bold(), product);
            }
        }
        Err(e) => error!("Failed to fetch profile. Err: {}", e),
    }
}
