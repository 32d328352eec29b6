//! Tubify Library
//!
//! This library takes the song playing in a YouTube video, finds the matching
//! track in the Spotify catalog and writes it into the user's Spotify library
//! or playlists. Authorization uses the OAuth 2.0 Authorization Code flow with
//! PKCE, so no client secret is ever stored.
//!
//! # Modules
//!
//! - `api` - HTTP handlers for the local redirect listener
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `error` - Error taxonomy shared by every layer
//! - `management` - Token storage, token lifecycle and scan sessions
//! - `server` - Local HTTP server receiving the OAuth redirect
//! - `spotify` - Spotify Web API client (auth, search, playlists)
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE helpers, normalization and clocks
//! - `youtube` - Song identity extraction from YouTube metadata
//!
//! # Example
//!
//! ```
//! use tubify::{config, youtube};
//!
//! #[tokio::main]
//! async fn main() -> tubify::Res<()> {
//!     config::load_env().await?;
//!     let guess = youtube::extract("Queen - Bohemian Rhapsody (Official Video)", None);
//!     assert_eq!(guess.artist.as_deref(), Some("Queen"));
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;
pub mod youtube;

/// A convenient Result type alias for the command-line glue.
///
/// Library functions return [`error::Result`]; this alias exists for the
/// binary entry points where any error is turned into a message and printed.
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Searching Spotify for {}", song);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
///
/// # Example
///
/// ```
/// success!("Added {} to {}", track, playlist);
/// ```
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only used at the command-line boundary. Library code returns
/// [`error::TubifyError`] instead.
///
/// # Example
///
/// ```
/// error!("Failed to load configuration");
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// # Example
///
/// ```
/// warning!("Token refresh failed: {}", e);
/// ```
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
