use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{SearchResponse, SongGuess, Track},
    utils::normalize,
};

pub const SEARCH_LIMIT: u32 = 50;

/// How strictly a search result has to agree with the guess.
///
/// Both policies require one of the track's artists to equal the guessed
/// artist after normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// The normalized track name must also equal the guessed song.
    #[default]
    Exact,
    /// Prefer an exact title, otherwise take the first track by the artist.
    ArtistOnly,
}

/// `artist:<artist> track:<song>` when the artist is known, else the bare song.
pub fn build_query(guess: &SongGuess) -> String {
    match &guess.artist {
        Some(artist) => format!("artist:{} track:{}", artist, guess.song),
        None => guess.song.clone(),
    }
}

/// Picks the one track that matches the guess, or none.
///
/// Without a guessed artist there is nothing to anchor on and no track is
/// chosen. Ties keep the order Spotify returned.
pub fn best_match<'a>(
    tracks: &'a [Track],
    guess: &SongGuess,
    policy: MatchPolicy,
) -> Option<&'a Track> {
    let artist = normalize(guess.artist.as_deref()?);
    let song = normalize(&guess.song);

    let mut by_artist = tracks
        .iter()
        .filter(|track| track.artists.iter().any(|a| normalize(&a.name) == artist))
        .peekable();

    let first = *by_artist.peek()?;
    let exact = by_artist.find(|track| normalize(&track.name) == song);

    match policy {
        MatchPolicy::Exact => exact,
        MatchPolicy::ArtistOnly => exact.or(Some(first)),
    }
}

impl SpotifyClient {
    /// `GET /search?type=track&limit=50`
    pub async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        let url = self.url("/search");
        let limit = SEARCH_LIMIT.to_string();

        let response = self
            .send(|http, token| {
                http.get(&url)
                    .bearer_auth(token)
                    .query(&[("q", query), ("type", "track"), ("limit", limit.as_str())])
            })
            .await?;

        let json = response.json::<SearchResponse>().await?;
        Ok(json.tracks.items)
    }

    /// Searches for the guessed song and commits to one track or none.
    pub async fn find_track(&self, guess: &SongGuess) -> Result<Option<Track>> {
        self.find_track_with(guess, MatchPolicy::default()).await
    }

    pub async fn find_track_with(
        &self,
        guess: &SongGuess,
        policy: MatchPolicy,
    ) -> Result<Option<Track>> {
        let tracks = self.search_tracks(&build_query(guess)).await?;
        Ok(best_match(&tracks, guess, policy).cloned())
    }
}
