//! ICY metadata block parsing
//!
//! Pure functions over the text carried in ICY metadata blocks, plus the
//! artist/title split used for display.

const STREAM_TITLE: &str = "StreamTitle";

/// Track information split out of a `StreamTitle` value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
}

impl StreamMetadata {
    /// Create metadata from an ICY title string.
    ///
    /// Splits on first ` - ` separator: "Artist - Title" → artist="Artist", title="Title".
    /// If no separator found, the whole string becomes the title.
    pub fn from_icy_title(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self {
                title: None,
                artist: None,
            };
        }

        match raw.split_once(" - ") {
            Some((artist, title)) => {
                let artist = artist.trim();
                let title = title.trim();
                Self {
                    title: (!title.is_empty()).then(|| title.to_string()),
                    artist: (!artist.is_empty()).then(|| artist.to_string()),
                }
            }
            None => Self {
                title: Some(raw.to_string()),
                artist: None,
            },
        }
    }
}

/// Extract the `StreamTitle` value from ICY metadata text.
///
/// Finds the field name, the first `'` after it, then the first `';` after
/// that quote. Returns `None` when the field or either marker is missing, or
/// when the value is blank.
pub fn parse_stream_title(metadata: &str) -> Option<String> {
    let field = metadata.find(STREAM_TITLE)?;
    let after_field = field + STREAM_TITLE.len();
    let open = after_field + metadata[after_field..].find('\'')?;
    let value_start = open + 1;
    let close = metadata[value_start..].find("';")?;
    let title = metadata[value_start..value_start + close].trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}

/// Extract the stream title from one raw metadata block.
///
/// Blocks are null-padded to a multiple of 16 bytes; padding is stripped and
/// invalid UTF-8 is replaced before parsing. Blocks without a recognizable
/// field (keep-alive beacons) yield `None`.
pub fn parse_metadata_block(block: &[u8]) -> Option<String> {
    let end = block.iter().rposition(|&b| b != 0).map(|p| p + 1)?;
    let text = String::from_utf8_lossy(&block[..end]);
    parse_stream_title(&text)
}
