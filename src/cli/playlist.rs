use tabled::Table;

use crate::{
    cli::{Context, confirm, search, spinner},
    error, info, success,
    types::{ConversionTableRow, PlaylistTableRow, TrackTableRow},
    warning, youtube,
};

pub async fn playlists() {
    let ctx = Context::load();

    let pb = spinner("Fetching playlists...");
    let result = ctx.client.list_playlists().await;
    pb.finish_and_clear();

    match result {
        Ok(playlists) if playlists.is_empty() => info!("You have no playlists."),
        Ok(playlists) => {
            let rows: Vec<PlaylistTableRow> = playlists
                .into_iter()
                .map(|p| PlaylistTableRow {
                    id: p.id,
                    name: p.name,
                })
                .collect();
            println!("{}", Table::new(rows));
        }
        Err(e) => error!("Failed to fetch playlists. Err: {}", e),
    }
}

pub async fn add(
    title: String,
    channel: Option<String>,
    playlist_id: String,
    yes: bool,
    loose: bool,
) {
    let ctx = Context::load();
    let session = search::session(&ctx, loose);

    let Some(result) = search::scan(&session, title, channel).await else {
        return;
    };
    let Some(track) = result.track else {
        return;
    };

    println!("{}", Table::new(vec![TrackTableRow::from(&track)]));
    if !yes && !confirm(&format!("Add \"{}\" to playlist {}?", track.name, playlist_id)) {
        info!("Nothing added.");
        return;
    }

    match session.add_to_playlist(&track, &playlist_id).await {
        Ok(_) => success!("Added {} to playlist {}", track.name, playlist_id),
        Err(e) => error!("Failed to add to playlist. Err: {}", e),
    }
}

pub async fn favorite(title: String, channel: Option<String>, yes: bool, loose: bool) {
    let ctx = Context::load();
    let session = search::session(&ctx, loose);

    let Some(result) = search::scan(&session, title, channel).await else {
        return;
    };
    let Some(track) = result.track else {
        return;
    };

    println!("{}", Table::new(vec![TrackTableRow::from(&track)]));
    if !yes && !confirm(&format!("Save \"{}\" to your library?", track.name)) {
        info!("Nothing saved.");
        return;
    }

    match session.save_to_library(&track).await {
        Ok(()) => success!("Saved {} to your library", track.name),
        Err(e) => error!("Failed to save track. Err: {}", e),
    }
}

pub async fn convert(input: String, name: String, loose: bool) {
    let ctx = Context::load();
    let session = search::session(&ctx, loose);

    let content = match async_fs::read_to_string(&input).await {
        Ok(content) => content,
        Err(e) => error!("Cannot read {}. Err: {}", input, e),
    };

    let videos = youtube::parse_video_list(&content);
    if videos.is_empty() {
        warning!("No videos found in {}", input);
        return;
    }

    info!("Scanning {} videos...", videos.len());
    let pb = spinner("Matching videos on Spotify...");
    let report = session.convert(&videos, &name).await;
    pb.finish_and_clear();

    let report = match report {
        Ok(report) => report,
        Err(e) => error!("Conversion failed. Err: {}", e),
    };

    let rows: Vec<ConversionTableRow> = report
        .results
        .iter()
        .map(|r| ConversionTableRow {
            video: r.video.video_title.clone(),
            guess: match &r.guess.artist {
                Some(artist) => format!("{} - {}", artist, r.guess.song),
                None => r.guess.song.clone(),
            },
            result: match &r.track {
                Some(track) => format!("✓ {} - {}", track.artist_names(), track.name),
                None => "not found".to_string(),
            },
        })
        .collect();
    println!("{}", Table::new(rows));

    let matched = report.matched().count();
    match report.playlist {
        Some(playlist) => success!(
            "Created playlist {} ({}) with {} of {} songs",
            playlist.name,
            playlist.id,
            matched,
            videos.len()
        ),
        None => warning!("None of the {} videos matched a Spotify track.", videos.len()),
    }
}
