//! Error types for radiostream
//!
//! Centralized error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single `open` call. The session is never left half-open.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error("URL must start with http:// or https://: {0}")]
    UnsupportedScheme(String),

    #[error("No active network")]
    NoNetwork,

    #[error("A stream is already running")]
    AlreadyActive,

    #[error("{0}")]
    Transport(String),

    #[error("HTTP {0}")]
    HttpStatus(u16),

    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    #[error("No stream URL found in playlist")]
    PlaylistWithoutUrl,

    #[error("Playlist nesting deeper than {0} levels")]
    PlaylistTooDeep(usize),
}

impl From<reqwest::Error> for ConnectError {
    fn from(e: reqwest::Error) -> Self {
        ConnectError::Transport(friendly_network_error(&e))
    }
}

/// Failure while decoding a live body
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("Malformed chunk size line: {0:?}")]
    MalformedChunkSize(String),

    #[error("Chunk size line too long")]
    ChunkSizeLineTooLong,

    #[error("Expected CRLF after chunk data, found byte 0x{0:02x}")]
    MissingChunkTerminator(u8),

    #[error("No data received for {0:?}")]
    Stalled(Duration),
}

/// Main error type for radiostream
#[derive(Error, Debug)]
pub enum RadioError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for radiostream
pub type Result<T> = std::result::Result<T, RadioError>;

fn friendly_network_error(e: &reqwest::Error) -> String {
    if e.is_builder() {
        if let Some(url) = e.url() {
            return format!("Invalid URL: {url}");
        }
        return "Invalid URL".to_string();
    }
    if e.is_redirect() {
        return "Redirect refused".to_string();
    }
    if e.is_connect() {
        if let Some(url) = e.url() {
            return format!("Could not connect to {}", url.host_str().unwrap_or("server"));
        }
        return "Could not connect to server".to_string();
    }
    if e.is_timeout() {
        return "Connection timed out".to_string();
    }
    if e.is_decode() {
        return "Invalid response from server".to_string();
    }
    format!("Network error: {e}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_error_messages() {
        assert_eq!(ConnectError::HttpStatus(404).to_string(), "HTTP 404");
        assert_eq!(
            ConnectError::UnsupportedContentType("text/html".into()).to_string(),
            "Unsupported content type: text/html"
        );
        assert!(ConnectError::UnsupportedScheme("ftp://x".into())
            .to_string()
            .contains("ftp://x"));
    }

    #[test]
    fn stream_error_shows_offending_byte() {
        let e = StreamError::MissingChunkTerminator(0x41);
        assert_eq!(e.to_string(), "Expected CRLF after chunk data, found byte 0x41");
    }

    #[test]
    fn radio_error_wraps_transparently() {
        let e: RadioError = ConnectError::AlreadyActive.into();
        assert_eq!(e.to_string(), "A stream is already running");
        let e: RadioError = StreamError::ChunkSizeLineTooLong.into();
        assert!(matches!(e, RadioError::Stream(_)));
    }
}
