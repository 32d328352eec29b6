//! # API Module
//!
//! HTTP handlers mounted on the local redirect listener while `tubify auth`
//! waits for Spotify to send the browser back.
//!
//! ## Endpoints
//!
//! - [`callback`] - Receives the authorization redirect (`code`, `state` or
//!   `error` query parameters), forwards it to the waiting authorization
//!   flow and answers with a page that closes its own window.
//! - [`health`] - Reports status and version, handy to check that the
//!   listener is up before the browser is sent off.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Extension, Router, routing::get};
//! use tubify::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback).layer(Extension(listener)))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;
