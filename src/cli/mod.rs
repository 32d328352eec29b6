//! # CLI Module
//!
//! Command implementations for the `tubify` binary. Every command builds its
//! collaborators from the environment, runs one user action and reports the
//! outcome with the console macros. Failures end the process through
//! [`error!`](crate::error!) with a single readable message.
//!
//! ## Commands
//!
//! - [`auth`] - Authorize with Spotify (Authorization Code + PKCE)
//! - [`logout`] - Forget stored credentials
//! - [`status`] - Show whether a usable token is stored
//! - [`whoami`] - Show the Spotify profile behind the token
//! - [`search`] - Find the Spotify track for a YouTube title
//! - [`playlists`] - List the user's playlists
//! - [`add`] - Find a track and add it to a playlist
//! - [`favorite`] - Find a track and save it to the library
//! - [`convert`] - Turn a list of YouTube videos into a new playlist
//!
//! ## Usage Patterns
//!
//! ```bash
//! tubify auth
//! tubify search --title "Queen - Bohemian Rhapsody (Official Video)"
//! tubify add --title "Some Song (HD)" --channel "SomeArtistVEVO" --playlist 37i9dQZF1DX
//! tubify convert --input liked-videos.tsv --name "From YouTube"
//! ```

mod auth;
mod info;
mod playlist;
mod search;

pub use auth::auth;
pub use auth::logout;
pub use info::status;
pub use info::whoami;
pub use playlist::add;
pub use playlist::convert;
pub use playlist::favorite;
pub use playlist::playlists;
pub use search::search;

use std::{
    io::{self, Write},
    sync::Arc,
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    config::Config,
    error,
    management::{FileStore, TokenManager, TokenStore},
    spotify::{self, SpotifyClient},
};

/// Collaborators shared by the commands.
pub(crate) struct Context {
    pub config: Config,
    pub http: reqwest::Client,
    pub tokens: Arc<TokenManager>,
    pub client: Arc<SpotifyClient>,
}

impl Context {
    pub(crate) fn load() -> Self {
        let config = match Config::from_env() {
            Ok(config) => config,
            Err(e) => error!("{}", e),
        };

        let http = match spotify::http_client(&config) {
            Ok(http) => http,
            Err(e) => error!("Cannot create HTTP client. Err: {}", e),
        };

        let store = TokenStore::new(Arc::new(FileStore::default_location()));
        let tokens = Arc::new(TokenManager::new(store, config.clone(), http.clone()));
        let client = Arc::new(SpotifyClient::with_http(
            config.clone(),
            Arc::clone(&tokens),
            http.clone(),
        ));

        Self {
            config,
            http,
            tokens,
            client,
        }
    }
}

pub(crate) fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Asks a yes/no question on stdin; anything but `y`/`yes` is a no.
pub(crate) fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
