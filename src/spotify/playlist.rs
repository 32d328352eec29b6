use crate::{
    error::Result,
    spotify::SpotifyClient,
    types::{
        AddTrackToPlaylistRequest, AddTrackToPlaylistResponse, CreatePlaylistRequest,
        GetUserPlaylistsResponse, Playlist, SaveTracksRequest,
    },
};

const PLAYLIST_PAGE_LIMIT: u32 = 50;
/// Spotify accepts at most 100 URIs per add request.
const ADD_TRACKS_CHUNK: usize = 100;

impl SpotifyClient {
    /// Lists the current user's playlists, following `next` links.
    pub async fn list_playlists(&self) -> Result<Vec<Playlist>> {
        let mut playlists = Vec::new();
        let mut next = Some(format!(
            "{}?limit={}",
            self.url("/me/playlists"),
            PLAYLIST_PAGE_LIMIT
        ));

        while let Some(page_url) = next {
            let response = self
                .send(|http, token| http.get(&page_url).bearer_auth(token))
                .await?;
            let page = response.json::<GetUserPlaylistsResponse>().await?;

            playlists.extend(page.items);
            next = page.next;
        }

        Ok(playlists)
    }

    /// Appends one track to a playlist and returns the new snapshot id.
    ///
    /// Spotify keeps duplicates, so calling this twice adds the track twice.
    pub async fn add_track(&self, playlist_id: &str, track_uri: &str) -> Result<String> {
        let url = self.url(&format!("/playlists/{playlist_id}/tracks"));
        let body = AddTrackToPlaylistRequest {
            uris: vec![track_uri.to_string()],
        };

        let response = self
            .send(|http, token| http.post(&url).bearer_auth(token).json(&body))
            .await?;

        Ok(response.json::<AddTrackToPlaylistResponse>().await?.snapshot_id)
    }

    /// Appends many tracks, 100 per request.
    pub async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let url = self.url(&format!("/playlists/{playlist_id}/tracks"));

        for chunk in uris.chunks(ADD_TRACKS_CHUNK) {
            let body = AddTrackToPlaylistRequest {
                uris: chunk.to_vec(),
            };
            self.send(|http, token| http.post(&url).bearer_auth(token).json(&body))
                .await?;
        }

        Ok(())
    }

    /// Saves a track to the user's library ("Liked Songs").
    pub async fn favorite(&self, track_id: &str) -> Result<()> {
        let url = self.url("/me/tracks");
        let body = SaveTracksRequest {
            ids: vec![track_id.to_string()],
        };

        self.send(|http, token| http.put(&url).bearer_auth(token).json(&body))
            .await?;
        Ok(())
    }

    /// Creates a private playlist owned by the current user.
    pub async fn create_playlist(&self, name: &str, description: &str) -> Result<Playlist> {
        let user = self.current_user().await?;
        let url = self.url(&format!("/users/{}/playlists", user.id));
        let body = CreatePlaylistRequest {
            name: name.to_string(),
            description: description.to_string(),
            public: false,
        };

        let response = self
            .send(|http, token| http.post(&url).bearer_auth(token).json(&body))
            .await?;

        Ok(response.json::<Playlist>().await?)
    }
}
