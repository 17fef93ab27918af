//! HTTP chunked transfer decoding
//!
//! `ChunkUnframer` is an incremental decoder for RFC 7230 chunk framing that
//! only ever consumes bytes already available from its source: a chunk-size
//! line split across several network arrivals is accumulated and finished
//! on a later call instead of waiting for it.

use tracing::trace;

use crate::error::StreamError;
use crate::stream::ByteSource;

/// Longest chunk-size line accepted (extensions included)
const MAX_SIZE_LINE: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Accumulating a chunk-size line
    SizeLine,
    /// Inside chunk data
    Data,
    /// Expecting the CRLF that closes a data chunk
    DataEnd { seen_cr: bool },
    /// The zero-size chunk has been read
    Done,
}

/// Chunk cursor plus the partial framing line being parsed
#[derive(Debug)]
pub struct ChunkUnframer {
    state: State,
    left: usize,
    line: Vec<u8>,
    chunks: u64,
}

impl Default for ChunkUnframer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkUnframer {
    pub fn new() -> Self {
        Self {
            state: State::SizeLine,
            left: 0,
            line: Vec::new(),
            chunks: 0,
        }
    }

    /// Back to the start-of-body state
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Data bytes left in the current chunk
    pub fn bytes_left(&self) -> usize {
        self.left
    }

    /// The terminating zero-size chunk has been seen
    pub fn is_done(&self) -> bool {
        self.state == State::Done
    }

    /// Number of non-empty chunks started so far
    pub fn chunks_started(&self) -> u64 {
        self.chunks
    }

    /// Consume framing from `src` up to and including the next chunk-size line.
    ///
    /// Discards the CRLF that ends the previous chunk first. Returns
    /// `Some(size)` once a size line is complete (`Some(0)` marks the end of
    /// the body) or `None` when more bytes are needed. Must only be called
    /// when the current chunk is used up.
    pub fn next_chunk_size<S>(&mut self, src: &mut S) -> Result<Option<usize>, StreamError>
    where
        S: ByteSource + ?Sized,
    {
        debug_assert_eq!(self.left, 0);
        loop {
            match self.state {
                State::Done => return Ok(Some(0)),
                State::Data => self.state = State::DataEnd { seen_cr: false },
                State::DataEnd { seen_cr } => {
                    let Some(b) = read_byte(src)? else {
                        return Ok(None);
                    };
                    match (seen_cr, b) {
                        (false, b'\r') => self.state = State::DataEnd { seen_cr: true },
                        (_, b'\n') => self.state = State::SizeLine,
                        _ => return Err(StreamError::MissingChunkTerminator(b)),
                    }
                }
                State::SizeLine => {
                    let Some(b) = read_byte(src)? else {
                        return Ok(None);
                    };
                    if b != b'\n' {
                        if self.line.len() >= MAX_SIZE_LINE {
                            return Err(StreamError::ChunkSizeLineTooLong);
                        }
                        self.line.push(b);
                        continue;
                    }

                    let size = parse_chunk_size(&self.line)?;
                    self.line.clear();
                    if size == 0 {
                        trace!(chunks = self.chunks, "last chunk");
                        self.state = State::Done;
                    } else {
                        trace!(size, "chunk");
                        self.state = State::Data;
                        self.left = size;
                        self.chunks += 1;
                    }
                    return Ok(Some(size));
                }
            }
        }
    }

    /// Chunk data bytes readable from `src` right now, advancing over any
    /// framing that has already arrived.
    pub fn readable<S>(&mut self, src: &mut S) -> Result<usize, StreamError>
    where
        S: ByteSource + ?Sized,
    {
        if self.left == 0 {
            match self.next_chunk_size(src)? {
                None | Some(0) => return Ok(0),
                Some(_) => {}
            }
        }
        Ok(self.left.min(src.available()?))
    }

    /// Record `n` data bytes taken from the current chunk
    pub fn consume(&mut self, n: usize) {
        self.left = self.left.saturating_sub(n);
    }
}

/// Chunk data of `src` exposed as a flat byte stream
pub struct Dechunked<'a, S: ?Sized> {
    pub src: &'a mut S,
    pub unframer: &'a mut ChunkUnframer,
}

impl<S: ByteSource + ?Sized> ByteSource for Dechunked<'_, S> {
    fn available(&mut self) -> Result<usize, StreamError> {
        self.unframer.readable(self.src)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let want = buf.len().min(self.unframer.readable(self.src)?);
        if want == 0 {
            return Ok(0);
        }
        let n = self.src.read(&mut buf[..want])?;
        self.unframer.consume(n);
        Ok(n)
    }

    fn is_exhausted(&mut self) -> bool {
        self.unframer.is_done() || self.src.is_exhausted()
    }
}

fn read_byte<S: ByteSource + ?Sized>(src: &mut S) -> Result<Option<u8>, StreamError> {
    let mut b = [0u8; 1];
    Ok((src.read(&mut b)? == 1).then_some(b[0]))
}

/// Parse `1a2f[;ext=val][\r]` into a size
fn parse_chunk_size(line: &[u8]) -> Result<usize, StreamError> {
    let text = String::from_utf8_lossy(line);
    let digits = text
        .split(';')
        .next()
        .unwrap_or_default()
        .trim_matches(|c: char| c.is_ascii_whitespace());
    if digits.is_empty() {
        return Err(StreamError::MalformedChunkSize(text.into_owned()));
    }
    usize::from_str_radix(digits, 16)
        .map_err(|_| StreamError::MalformedChunkSize(text.into_owned()))
}
