use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    error::{Result, TubifyError},
    spotify::{SpotifyClient, search::MatchPolicy},
    types::{Playlist, SongGuess, Track, VideoContext},
    youtube,
};

/// Outcome of scanning one video.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub video: VideoContext,
    pub guess: SongGuess,
    pub track: Option<Track>,
}

#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub results: Vec<ScanResult>,
    /// `None` when nothing matched and no playlist was created.
    pub playlist: Option<Playlist>,
}

impl ConversionReport {
    pub fn matched(&self) -> impl Iterator<Item = &Track> {
        self.results.iter().filter_map(|r| r.track.as_ref())
    }
}

/// Runs user-triggered scans one at a time.
///
/// A scan is extract → ensure token → search. Writing the result anywhere is
/// a separate call the user has to confirm.
pub struct ScanSession {
    client: Arc<SpotifyClient>,
    policy: MatchPolicy,
    busy: AtomicBool,
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(flag))
            .map_err(|_| TubifyError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScanSession {
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Self::with_policy(client, MatchPolicy::default())
    }

    pub fn with_policy(client: Arc<SpotifyClient>, policy: MatchPolicy) -> Self {
        Self {
            client,
            policy,
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Fails with [`TubifyError::Busy`] while another scan is in flight.
    pub async fn scan(&self, video: &VideoContext) -> Result<ScanResult> {
        let _guard = BusyGuard::acquire(&self.busy)?;

        let guess = youtube::extract(&video.video_title, video.channel_name.as_deref());
        self.client.tokens().require_token().await?;
        let track = self.client.find_track_with(&guess, self.policy).await?;

        Ok(ScanResult {
            video: video.clone(),
            guess,
            track,
        })
    }

    pub async fn add_to_playlist(&self, track: &Track, playlist_id: &str) -> Result<String> {
        self.client.add_track(playlist_id, &track.uri).await
    }

    pub async fn save_to_library(&self, track: &Track) -> Result<()> {
        self.client.favorite(&track.id).await
    }

    /// Scans every video in order and collects the matches into a new
    /// private playlist called `name`.
    pub async fn convert(&self, videos: &[VideoContext], name: &str) -> Result<ConversionReport> {
        let mut results = Vec::with_capacity(videos.len());
        for video in videos {
            results.push(self.scan(video).await?);
        }

        let uris: Vec<String> = results
            .iter()
            .filter_map(|r| r.track.as_ref().map(|t| t.uri.clone()))
            .collect();

        if uris.is_empty() {
            return Ok(ConversionReport {
                results,
                playlist: None,
            });
        }

        let description = format!("Converted from {} YouTube videos by tubify", videos.len());
        let playlist = self.client.create_playlist(name, &description).await?;
        self.client.add_tracks(&playlist.id, &uris).await?;

        Ok(ConversionReport {
            results,
            playlist: Some(playlist),
        })
    }
}
