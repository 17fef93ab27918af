//! Stream handling
//!
//! Negotiates HTTP audio streams (following PLS/M3U playlists by content
//! type), unframes chunked bodies, de-interleaves ICY metadata and locates
//! the first MPEG frame. Every stage pulls through [`ByteSource`] so the
//! whole pipeline only ever touches bytes that have already arrived.

use crate::error::StreamError;

pub mod chunked;
pub mod http;
pub mod icy;
pub mod metadata;
pub mod negotiate;
pub mod playlist;
pub mod session;
pub mod sync;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use http::{Connection, Connector, HttpConnector, StreamRequest};
pub use metadata::StreamMetadata;
pub use session::{PumpOutcome, StreamSession};
pub use types::{ByteBudget, Codec, Credentials, Negotiated, OpenOptions};

/// Non-blocking byte stream
///
/// `read` never waits: it returns at most what `available` reported and `0`
/// when nothing has arrived yet.
pub trait ByteSource {
    /// Bytes that can be read right now
    fn available(&mut self) -> Result<usize, StreamError>;

    /// Read up to `buf.len()` already-arrived bytes
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError>;

    /// No further bytes will ever arrive
    fn is_exhausted(&mut self) -> bool;
}
