use std::sync::Arc;

use tabled::Table;

use crate::{
    cli::{Context, spinner},
    error,
    management::{ScanResult, ScanSession},
    spotify::search::MatchPolicy,
    types::{TrackTableRow, VideoContext},
    warning,
};

pub async fn search(title: String, channel: Option<String>, loose: bool) {
    let ctx = Context::load();
    let session = session(&ctx, loose);

    let Some(result) = scan(&session, title, channel).await else {
        return;
    };

    if let Some(track) = &result.track {
        println!("{}", Table::new(vec![TrackTableRow::from(track)]));
    }
}

pub(crate) fn session(ctx: &Context, loose: bool) -> ScanSession {
    let policy = if loose {
        MatchPolicy::ArtistOnly
    } else {
        MatchPolicy::Exact
    };
    ScanSession::with_policy(Arc::clone(&ctx.client), policy)
}

/// Scans one video and reports the guess. `None` when nothing matched.
pub(crate) async fn scan(
    session: &ScanSession,
    title: String,
    channel: Option<String>,
) -> Option<ScanResult> {
    let video = VideoContext {
        video_title: title,
        channel_name: channel,
    };

    let pb = spinner("Searching Spotify...");
    let result = session.scan(&video).await;
    pb.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => error!("Search failed. Err: {}", e),
    };

    match (&result.guess.artist, &result.track) {
        (_, Some(_)) => Some(result),
        (None, None) => {
            warning!(
                "Could not find this song: no artist in \"{}\". Try passing --channel.",
                result.video.video_title
            );
            None
        }
        (Some(artist), None) => {
            warning!(
                "Could not find this song: \"{}\" by {}",
                result.guess.song,
                artist
            );
            None
        }
    }
}
