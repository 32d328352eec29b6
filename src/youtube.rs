//! Song identity extraction from YouTube video metadata.
//!
//! Video titles are written by humans and decorated with annotations such as
//! `(Official Video)` or `[HD]`. [`extract`] strips those, then tries to read
//! `Artist - Song` from the title and falls back to the channel name.

use crate::types::{SongGuess, VideoContext};

/// Annotation labels removed from titles, matched case-insensitively in
/// either `(...)` or `[...]` form.
pub const ANNOTATIONS: &[&str] = &[
    "Official Video",
    "Official Music Video",
    "Lyric Video",
    "Audio",
    "Official Audio",
    "Visualizer",
    "Official Visualizer",
    "Lyrics",
    "HQ",
    "HD",
];

const VEVO: &str = "VEVO";

/// Guesses `(artist, song)` from a video title and its channel name.
///
/// # Example
///
/// ```
/// let guess = tubify::youtube::extract("Some Song (HD)", Some("SomeArtistVEVO"));
/// assert_eq!(guess.artist.as_deref(), Some("SomeArtist"));
/// assert_eq!(guess.song, "Some Song");
/// ```
pub fn extract(title: &str, channel_name: Option<&str>) -> SongGuess {
    let cleaned = strip_annotations(title);
    let channel = channel_name.map(str::to_string);

    if let Some((artist, song)) = split_artist_song(&cleaned) {
        return SongGuess {
            artist: Some(artist),
            song,
            channel_name: channel,
        };
    }

    let song = cleaned.trim().to_string();
    let artist = channel_name
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .and_then(|c| {
            if c.contains(VEVO) {
                let stripped = c.replace(VEVO, "").trim().to_string();
                (!stripped.is_empty()).then_some(stripped)
            } else {
                Some(c.to_string())
            }
        });

    SongGuess {
        artist,
        song,
        channel_name: channel,
    }
}

/// Removes every bracketed annotation from [`ANNOTATIONS`] and trims.
pub fn strip_annotations(title: &str) -> String {
    let mut cleaned = title.to_string();
    for label in ANNOTATIONS {
        for (open, close) in [('(', ')'), ('[', ']')] {
            let marker = format!("{open}{label}{close}");
            cleaned = remove_ignore_ascii_case(&cleaned, &marker);
        }
    }
    cleaned.trim().to_string()
}

/// `Artist - Song` when the title holds exactly one dash with text on both sides.
fn split_artist_song(title: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = title.split('-').map(str::trim).collect();
    match parts.as_slice() {
        [artist, song] if !artist.is_empty() && !song.is_empty() => {
            Some((artist.to_string(), song.to_string()))
        }
        _ => None,
    }
}

// ASCII lower-casing keeps byte offsets intact, so indices found in the
// lowered copy are valid in the original.
fn remove_ignore_ascii_case(haystack: &str, needle: &str) -> String {
    let needle = needle.to_ascii_lowercase();
    let mut out = String::with_capacity(haystack.len());
    let mut rest = haystack;

    while let Some(pos) = rest.to_ascii_lowercase().find(&needle) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos + needle.len()..];
    }
    out.push_str(rest);
    out
}

/// Parses a list of videos, one per line as `title<TAB>channel`.
///
/// The channel column is optional. Blank lines and lines starting with `#`
/// are skipped.
pub fn parse_video_list(content: &str) -> Vec<VideoContext> {
    content
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.trim().is_empty() && !line.trim_start().starts_with('#'))
        .map(|line| {
            let (title, channel) = match line.split_once('\t') {
                Some((title, channel)) => (title, Some(channel.trim())),
                None => (line, None),
            };
            VideoContext {
                video_title: title.trim().to_string(),
                channel_name: channel.filter(|c| !c.is_empty()).map(str::to_string),
            }
        })
        .collect()
}
