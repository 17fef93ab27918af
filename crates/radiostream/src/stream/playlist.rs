//! Playlist redirects (PLS/M3U)
//!
//! A station URL may answer with a playlist instead of audio. Playlists are
//! recognized by content type and resolved to the first `http` URL they
//! contain.

/// Content types served for PLS/M3U/HLS playlist files
const PLAYLIST_TYPES: &[&str] = &[
    "audio/x-mpegurl",
    "application/x-mpegurl",
    "application/pls+xml",
    "application/vnd.apple.mpegurl",
];

/// PLS servers append vendor suffixes to this one
const PLS_PREFIX: &str = "audio/x-scpls";

/// Lowercased media type with parameters (`; charset=...`) removed
pub fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Whether a response content type denotes a playlist file
pub fn is_playlist_type(content_type: &str) -> bool {
    let media = media_type(content_type);
    media.starts_with(PLS_PREFIX) || PLAYLIST_TYPES.contains(&media.as_str())
}

/// First stream URL in a playlist body.
///
/// Takes the first occurrence of `http` anywhere in the body up to the end
/// of its line, trimmed. Works for both `File1=http://...` (PLS) and bare
/// URL lines (M3U).
pub fn first_stream_url(body: &str) -> Option<String> {
    let start = body.find("http")?;
    let line = body[start..].split('\n').next().unwrap_or_default().trim();
    if line.is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}
