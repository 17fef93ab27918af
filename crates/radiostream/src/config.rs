//! Configuration for the radiostream engine
//!
//! Compile-time defaults grouped by concern, plus `SessionConfig`, the
//! runtime-tunable view of them that can be loaded from JSON.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RadioError, Result};

/// Audio sink configuration
pub mod audio {
    /// Volume applied to the sink before anything else touches it
    pub const INITIAL_VOLUME: u8 = 93;

    /// Upper bound for `set_volume`
    pub const MAX_VOLUME: u8 = 100;
}

/// Network-related configuration
pub mod network {
    /// User agent for HTTP requests
    pub const USER_AGENT: &str = concat!("radiostream/", env!("CARGO_PKG_VERSION"));

    /// Connect timeout for plaintext targets (milliseconds)
    pub const CONNECT_TIMEOUT_MS: u64 = 250;

    /// Connect timeout for TLS targets (milliseconds)
    pub const CONNECT_TIMEOUT_MS_TLS: u64 = 2500;

    /// Per-read timeout on the response body in seconds
    pub const READ_TIMEOUT_SECS: u64 = 30;

    /// Maximum playlist resolution depth
    pub const MAX_PLAYLIST_DEPTH: usize = 5;

    /// Largest playlist body read into memory (bytes)
    pub const MAX_PLAYLIST_BYTES: usize = 64 * 1024;

    /// Maximum number of same-scheme HTTP redirects followed
    pub const MAX_REDIRECTS: usize = 10;
}

/// Flow-control configuration
pub mod buffer {
    /// Bytes handed to the sink per feed (the decoder's preferred chunk size)
    pub const PACKET_SIZE: usize = 32;

    /// Buffered bytes to wait for before starting the sink
    pub const PREBUFFER_BYTES: usize = 6 * 1024;

    /// Pump calls to wait for the prebuffer before starting anyway
    pub const PREBUFFER_RETRIES: u32 = 10;

    /// Nominal body chunk size; a connection holds up to four before the
    /// reader is left to block (bytes)
    pub const READER_CHUNK_SIZE: usize = 8 * 1024;

    /// Chunks the background reader may queue before blocking on the socket
    pub const READER_CHANNEL_BOUND: usize = 32;

    /// Leading bytes scanned for an MPEG frame header before giving up
    pub const MAX_FRAME_SYNC_SCAN: usize = 16 * 1024;
}

/// Queue configuration
pub mod queue {
    /// Maximum number of items in a play queue
    pub const MAX_ITEMS: usize = 100;
}

/// Runtime session settings. Every field falls back to its default when
/// absent from a config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Send `Icy-MetaData: 1` and de-interleave metadata when offered
    pub request_metadata: bool,
    pub packet_size: usize,
    pub prebuffer_bytes: usize,
    pub prebuffer_retries: u32,
    pub connect_timeout_ms: u64,
    pub connect_timeout_ms_tls: u64,
    pub read_timeout_secs: u64,
    pub max_playlist_depth: usize,
    pub max_playlist_bytes: usize,
    /// Abort a started session after this long without data. `None` streams
    /// until stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stall_timeout_ms: Option<u64>,
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_metadata: true,
            packet_size: buffer::PACKET_SIZE,
            prebuffer_bytes: buffer::PREBUFFER_BYTES,
            prebuffer_retries: buffer::PREBUFFER_RETRIES,
            connect_timeout_ms: network::CONNECT_TIMEOUT_MS,
            connect_timeout_ms_tls: network::CONNECT_TIMEOUT_MS_TLS,
            read_timeout_secs: network::READ_TIMEOUT_SECS,
            max_playlist_depth: network::MAX_PLAYLIST_DEPTH,
            max_playlist_bytes: network::MAX_PLAYLIST_BYTES,
            stall_timeout_ms: None,
            user_agent: network::USER_AGENT.to_string(),
        }
    }
}

impl SessionConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RadioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    fn validate(&self) -> Result<()> {
        if self.packet_size == 0 {
            return Err(RadioError::Config("packet_size must be at least 1".into()));
        }
        if self.max_playlist_depth == 0 {
            return Err(RadioError::Config(
                "max_playlist_depth must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Connect timeout for the given target URL
    pub fn connect_timeout_for(&self, url: &str) -> Duration {
        if url.starts_with("https") {
            Duration::from_millis(self.connect_timeout_ms_tls)
        } else {
            Duration::from_millis(self.connect_timeout_ms)
        }
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn stall_timeout(&self) -> Option<Duration> {
        self.stall_timeout_ms.map(Duration::from_millis)
    }
}
