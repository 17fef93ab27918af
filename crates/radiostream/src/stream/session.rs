//! Live stream session
//!
//! Owns one negotiated connection and the decoding stages layered on it:
//! chunk unframing, ICY de-interleaving and MPEG frame sync. Each `pump`
//! moves at most what has already arrived into the sink, one packet at a
//! time, while the sink keeps asking for more.

use std::time::{Duration, Instant};

use tracing::{debug, info, trace};

use crate::audio::events::{EventBus, StreamEvent};
use crate::audio::sink::AudioSink;
use crate::config::{buffer, SessionConfig};
use crate::error::StreamError;
use crate::stream::chunked::{ChunkUnframer, Dechunked};
use crate::stream::http::Connection;
use crate::stream::icy::MetadataDeinterleaver;
use crate::stream::sync::FrameSync;
use crate::stream::types::{ByteBudget, Codec, Negotiated};

/// Result of one `pump` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpOutcome {
    /// Still waiting for the prebuffer target
    Prebuffering,
    /// Playing, nothing moved this call
    Idle,
    /// Audio bytes handed to the sink this call
    Streaming { delivered: usize },
    /// Body complete; the caller should tear the session down
    Finished,
}

#[derive(Debug, Clone, Copy)]
struct Prebuffer {
    target: usize,
    retries: u32,
    attempts: u32,
}

impl Prebuffer {
    /// Count one attempt; true once playback should start
    fn ready(&mut self, available: usize, budget: ByteBudget) -> bool {
        self.attempts += 1;
        let target = match budget.remaining() {
            Some(left) => self.target.min(usize::try_from(left).unwrap_or(usize::MAX)),
            None => self.target,
        };
        available >= target || self.attempts > self.retries
    }
}

pub struct StreamSession {
    negotiated: Negotiated,
    connection: Box<dyn Connection>,
    /// Present when the body still carries chunk framing
    unframer: Option<ChunkUnframer>,
    deinterleaver: MetadataDeinterleaver,
    frame_sync: FrameSync,
    budget: ByteBudget,
    packet: Vec<u8>,
    prebuffer: Prebuffer,
    started: bool,
    last_title: Option<String>,
    last_data: Instant,
    stall_timeout: Option<Duration>,
    delivered: u64,
}

impl StreamSession {
    pub fn new(negotiated: Negotiated, connection: Box<dyn Connection>, config: &SessionConfig) -> Self {
        let unframer = (negotiated.chunked && connection.passes_chunk_framing())
            .then(ChunkUnframer::new);
        let frame_sync = if negotiated.codec == Codec::Mp3 && negotiated.chunked {
            FrameSync::new(buffer::MAX_FRAME_SYNC_SCAN)
        } else {
            FrameSync::passthrough()
        };

        Self {
            deinterleaver: MetadataDeinterleaver::new(negotiated.metaint),
            budget: negotiated.budget,
            negotiated,
            connection,
            unframer,
            frame_sync,
            packet: vec![0u8; config.packet_size.max(1)],
            prebuffer: Prebuffer {
                target: config.prebuffer_bytes,
                retries: config.prebuffer_retries,
                attempts: 0,
            },
            started: false,
            last_title: None,
            last_data: Instant::now(),
            stall_timeout: config.stall_timeout(),
            delivered: 0,
        }
    }

    pub fn negotiated(&self) -> &Negotiated {
        &self.negotiated
    }

    pub fn url(&self) -> &str {
        &self.negotiated.url
    }

    pub fn budget(&self) -> ByteBudget {
        self.budget
    }

    /// Sink has been started
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Audio bytes handed to the sink so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Audio bytes since the last metadata block
    pub fn metadata_position(&self) -> usize {
        self.deinterleaver.position()
    }

    /// Move whatever has arrived into `sink`.
    ///
    /// Never waits on the network. Errors leave the session unusable; the
    /// caller is expected to close it.
    pub fn pump<K: AudioSink + ?Sized>(
        &mut self,
        sink: &mut K,
        events: &EventBus,
    ) -> Result<PumpOutcome, StreamError> {
        let available = self.connection.available()?;

        if !self.started {
            let closed = !self.connection.is_connected();
            if !closed && !self.prebuffer.ready(available, self.budget) {
                trace!(available, attempts = self.prebuffer.attempts, "prebuffering");
                return Ok(PumpOutcome::Prebuffering);
            }
            debug!(
                available,
                attempts = self.prebuffer.attempts,
                "prebuffer done, starting playback"
            );
            sink.start();
            self.started = true;
            self.last_data = Instant::now();
        }

        if available > 0 {
            self.last_data = Instant::now();
        }

        let mut delivered = 0;
        while sink.is_ready() && !self.budget.is_exhausted() {
            let limit = match self.budget.remaining() {
                Some(left) => self.packet.len().min(usize::try_from(left).unwrap_or(usize::MAX)),
                None => self.packet.len(),
            };
            let n = self.read_audio(limit)?;
            self.publish_title(events);
            if n == 0 {
                break;
            }
            let fed = self.frame_sync.feed(&self.packet[..n], sink);
            self.budget.consume(fed);
            delivered += fed;
        }
        self.delivered += delivered as u64;

        if self.is_complete() {
            info!(url = %self.negotiated.url, bytes = self.delivered, "stream complete");
            return Ok(PumpOutcome::Finished);
        }

        if available == 0 {
            if let Some(timeout) = self.stall_timeout {
                if self.last_data.elapsed() >= timeout {
                    return Err(StreamError::Stalled(timeout));
                }
            }
        }

        Ok(if delivered > 0 {
            PumpOutcome::Streaming { delivered }
        } else {
            PumpOutcome::Idle
        })
    }

    /// Close the connection and forget all cursor state
    pub fn close(&mut self) {
        self.connection.close();
        if let Some(unframer) = self.unframer.as_mut() {
            unframer.reset();
        }
        self.deinterleaver.reset();
        self.started = false;
    }

    /// Read up to `limit` audio bytes into the packet buffer
    fn read_audio(&mut self, limit: usize) -> Result<usize, StreamError> {
        let buf = &mut self.packet[..limit];
        match self.unframer.as_mut() {
            Some(unframer) => {
                let mut body = Dechunked {
                    src: &mut *self.connection,
                    unframer,
                };
                self.deinterleaver.read(&mut body, buf)
            }
            None => self.deinterleaver.read(&mut *self.connection, buf),
        }
    }

    fn publish_title(&mut self, events: &EventBus) {
        let Some(title) = self.deinterleaver.take_title() else {
            return;
        };
        if self.last_title.as_deref() == Some(title.as_str()) {
            return;
        }
        debug!(%title, "stream title");
        events.emit(StreamEvent::StreamTitle(title.clone()));
        self.last_title = Some(title);
    }

    fn is_complete(&mut self) -> bool {
        if self.budget.is_exhausted() {
            return true;
        }
        match self.unframer.as_ref() {
            Some(unframer) if unframer.is_done() => true,
            _ => self.connection.is_exhausted(),
        }
    }
}
