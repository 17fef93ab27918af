//! ICY metadata de-interleaving
//!
//! Icecast/Shoutcast servers insert a metadata block after every `metaint`
//! audio bytes: one length byte (× 16) followed by that many bytes of
//! `StreamTitle='...';` text. `MetadataDeinterleaver` splits those blocks
//! out of the flat body so only audio reaches the sink. Reads never cross a
//! metadata boundary, whatever the caller's buffer size.

use tracing::trace;

use crate::error::StreamError;
use crate::stream::metadata::parse_metadata_block;
use crate::stream::ByteSource;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// Passing audio through
    Audio,
    /// At a boundary, waiting for the length byte
    Length,
    /// Collecting a metadata block of `len` bytes
    Block { len: usize },
}

/// Metadata cursor for one session
#[derive(Debug)]
pub struct MetadataDeinterleaver {
    metaint: usize,
    /// Audio bytes since the last metadata block
    since_meta: usize,
    state: State,
    block: Vec<u8>,
    blocks_seen: u64,
    pending_title: Option<String>,
}

impl MetadataDeinterleaver {
    /// `metaint == 0` disables de-interleaving; the stream passes through.
    pub fn new(metaint: usize) -> Self {
        Self {
            metaint,
            since_meta: 0,
            state: State::Audio,
            block: Vec::new(),
            blocks_seen: 0,
            pending_title: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.metaint > 0
    }

    pub fn metaint(&self) -> usize {
        self.metaint
    }

    /// Audio bytes delivered since the last boundary, always below `metaint`
    /// while de-interleaving is enabled
    pub fn position(&self) -> usize {
        self.since_meta
    }

    pub fn blocks_seen(&self) -> u64 {
        self.blocks_seen
    }

    /// Title from the most recent block that carried one, if not yet taken
    pub fn take_title(&mut self) -> Option<String> {
        self.pending_title.take()
    }

    /// Forget all position state
    pub fn reset(&mut self) {
        *self = Self::new(self.metaint);
    }

    /// Read audio bytes from `src` into `buf`, consuming any metadata that
    /// has arrived at a boundary along the way.
    ///
    /// Returns 0 when no audio is available right now. Never returns bytes
    /// from past the next metadata boundary.
    pub fn read<S>(&mut self, src: &mut S, buf: &mut [u8]) -> Result<usize, StreamError>
    where
        S: ByteSource + ?Sized,
    {
        if !self.is_enabled() {
            return src.read(buf);
        }

        loop {
            match self.state {
                State::Audio => {
                    let to_boundary = self.metaint - self.since_meta;
                    let want = buf.len().min(to_boundary);
                    let n = src.read(&mut buf[..want])?;
                    self.since_meta += n;
                    if self.since_meta == self.metaint {
                        // the boundary lives in the state from here on
                        self.since_meta = 0;
                        self.state = State::Length;
                    }
                    return Ok(n);
                }
                State::Length => {
                    let mut len_byte = [0u8; 1];
                    if src.read(&mut len_byte)? == 0 {
                        return Ok(0);
                    }
                    let len = len_byte[0] as usize * 16;
                    if len == 0 {
                        self.finish_block();
                    } else {
                        self.block.clear();
                        self.block.reserve(len);
                        self.state = State::Block { len };
                    }
                }
                State::Block { len } => {
                    let start = self.block.len();
                    self.block.resize(len, 0);
                    let n = src.read(&mut self.block[start..])?;
                    self.block.truncate(start + n);
                    if self.block.len() < len {
                        return Ok(0);
                    }
                    self.blocks_seen += 1;
                    match parse_metadata_block(&self.block) {
                        Some(title) => {
                            trace!(%title, "metadata block");
                            self.pending_title = Some(title);
                        }
                        None => trace!(len, "metadata block without title"),
                    }
                    self.finish_block();
                }
            }
        }
    }

    fn finish_block(&mut self) {
        self.block.clear();
        self.state = State::Audio;
    }
}

/// Parse an `icy-metaint` header value; anything unusable disables metadata
pub fn parse_metaint(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0)
}
