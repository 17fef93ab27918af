//! HTTP transport
//!
//! `Connector`/`Connection` are the seam between the session engine and
//! whatever performs DNS, TCP/TLS and HTTP header parsing. `HttpConnector`
//! is the reqwest-backed implementation. Each connection owns a
//! single-threaded tokio runtime: `open` drives the request on it until the
//! headers arrive, then a background thread takes the runtime over and pulls
//! the body into a bounded channel, so the session polls for already-arrived
//! bytes without blocking. Closing cancels that thread and waits for it, which
//! drops the response and its socket before `close` returns.

use std::collections::VecDeque;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use reqwest::header::{HeaderMap, RANGE};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tokio::runtime::{self, Runtime};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::buffer::{READER_CHANNEL_BOUND, READER_CHUNK_SIZE};
use crate::config::network::MAX_REDIRECTS;
use crate::error::{ConnectError, StreamError};
use crate::stream::types::Credentials;
use crate::stream::ByteSource;

/// Arrived-but-unread bytes held before the reader thread is left to block
const MAX_PENDING_BYTES: usize = READER_CHUNK_SIZE * 4;

/// Everything needed to issue one GET for a stream
#[derive(Debug, Clone)]
pub struct StreamRequest<'a> {
    pub url: &'a str,
    /// Value of the `Icy-MetaData` opt-in header
    pub request_metadata: bool,
    pub range_start: Option<u64>,
    pub credentials: Option<&'a Credentials>,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub user_agent: &'a str,
}

/// Opens HTTP connections for the session engine
pub trait Connector {
    /// Whether any network path is currently up
    fn network_available(&self) -> bool {
        true
    }

    /// Issue the GET and return once the status line and headers are in
    fn open(&mut self, request: &StreamRequest<'_>) -> Result<Box<dyn Connection>, ConnectError>;
}

/// One HTTP response whose body is consumed incrementally
pub trait Connection: ByteSource {
    fn status(&self) -> u16;

    /// Response header value, matched case-insensitively
    fn header(&self, name: &str) -> Option<&str>;

    /// Declared `Content-Length`, if any
    fn content_length(&self) -> Option<u64>;

    /// The transport is still attached to the server
    fn is_connected(&self) -> bool;

    /// Whether chunked transfer framing reaches `read` untouched. Transports
    /// that decode `Transfer-Encoding: chunked` themselves return false.
    fn passes_chunk_framing(&self) -> bool {
        true
    }

    /// Read the whole (small) body, waiting at most the read timeout between
    /// pieces and keeping at most `limit` bytes
    fn read_to_string(&mut self, limit: usize) -> Result<String, ConnectError>;

    /// Drop the connection and any unread bytes
    fn close(&mut self);
}

/// reqwest-backed connector
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for HttpConnector {
    fn open(&mut self, request: &StreamRequest<'_>) -> Result<Box<dyn Connection>, ConnectError> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConnectError::Transport(format!("Could not start transport: {e}")))?;

        // read_timeout bounds the wait for headers and every body read
        let client = Client::builder()
            .user_agent(request.user_agent)
            .connect_timeout(request.connect_timeout)
            .read_timeout(request.read_timeout)
            .redirect(same_scheme_redirects())
            .build()?;

        let url = request.url.replace(' ', "%20");
        debug!(url = %url, "connecting");

        let icy = if request.request_metadata { "1" } else { "0" };
        let mut builder = client.get(&url).header("Icy-MetaData", icy);
        if let Some(offset) = request.range_start {
            builder = builder.header(RANGE, format!("bytes={offset}-"));
        }
        if let Some(credentials) = request.credentials {
            builder = builder.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = runtime.block_on(builder.send())?;
        debug!(status = response.status().as_u16(), "response headers received");
        Ok(Box::new(HttpConnection::spawn(runtime, response, request.read_timeout)))
    }
}

/// Follow redirects only while the scheme stays the same
fn same_scheme_redirects() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let same_scheme = attempt
            .previous()
            .last()
            .map_or(true, |prev| prev.scheme() == attempt.url().scheme());
        if same_scheme {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

/// A live reqwest response drained by a background reader thread
pub struct HttpConnection {
    status: u16,
    headers: HeaderMap,
    content_length: Option<u64>,
    pending: VecDeque<u8>,
    receiver: Option<Receiver<Vec<u8>>>,
    disconnected: bool,
    read_timeout: Duration,
    stop: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl HttpConnection {
    fn spawn(runtime: Runtime, response: Response, read_timeout: Duration) -> Self {
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let content_length = response.content_length();

        let (tx, rx) = bounded::<Vec<u8>>(READER_CHANNEL_BOUND);
        let stop = CancellationToken::new();
        let reader_stop = stop.clone();

        let handle = thread::Builder::new()
            .name("http-body-reader".to_string())
            .spawn(move || read_body(runtime, response, tx, reader_stop));

        let (receiver, handle, disconnected) = match handle {
            Ok(handle) => (Some(rx), Some(handle), false),
            Err(e) => {
                debug!(error = %e, "could not spawn body reader");
                (None, None, true)
            }
        };

        Self {
            status,
            headers,
            content_length,
            pending: VecDeque::new(),
            receiver,
            disconnected,
            read_timeout,
            stop,
            handle,
        }
    }

    /// Create a connection fed from a test channel (bypasses HTTP)
    #[cfg(test)]
    pub(crate) fn from_test_channel(
        status: u16,
        headers: HeaderMap,
        receiver: Receiver<Vec<u8>>,
    ) -> (Self, CancellationToken) {
        let stop = CancellationToken::new();
        let stop_clone = stop.clone();
        (
            Self {
                status,
                headers,
                content_length: None,
                pending: VecDeque::new(),
                receiver: Some(receiver),
                disconnected: false,
                read_timeout: Duration::from_millis(200),
                stop,
                handle: None,
            },
            stop_clone,
        )
    }

    /// Move already-arrived chunks into `pending` without waiting
    fn drain_arrived(&mut self) {
        let Some(receiver) = &self.receiver else {
            self.disconnected = true;
            return;
        };
        while self.pending.len() < MAX_PENDING_BYTES {
            match receiver.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
            }
        }
    }
}

impl ByteSource for HttpConnection {
    fn available(&mut self) -> Result<usize, StreamError> {
        self.drain_arrived();
        Ok(self.pending.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        if self.pending.len() < buf.len() {
            self.drain_arrived();
        }
        let n = buf.len().min(self.pending.len());
        for (dst, src) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn is_exhausted(&mut self) -> bool {
        self.drain_arrived();
        self.disconnected && self.pending.is_empty()
    }
}

impl Connection for HttpConnection {
    fn status(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name.to_ascii_lowercase().as_str())
            .and_then(|v| v.to_str().ok())
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn is_connected(&self) -> bool {
        !self.disconnected
    }

    // hyper strips chunk framing before the body reaches us
    fn passes_chunk_framing(&self) -> bool {
        false
    }

    fn read_to_string(&mut self, limit: usize) -> Result<String, ConnectError> {
        while self.pending.len() < limit {
            let Some(receiver) = &self.receiver else { break };
            match receiver.recv_timeout(self.read_timeout) {
                Ok(chunk) => self.pending.extend(chunk),
                Err(RecvTimeoutError::Disconnected) => {
                    self.disconnected = true;
                    break;
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(ConnectError::Transport(
                        "Timed out reading response body".to_string(),
                    ));
                }
            }
        }
        let body: Vec<u8> = self.pending.drain(..).take(limit).collect();
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn close(&mut self) {
        self.stop.cancel();
        // Dropping the receiver unblocks a reader waiting on a full channel
        self.receiver = None;
        self.pending.clear();
        self.disconnected = true;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                debug!("body reader panicked");
            }
        }
    }
}

impl Drop for HttpConnection {
    fn drop(&mut self) {
        self.close();
    }
}

/// Background thread: copy the response body into the channel until EOF,
/// error, cancellation, or the receiving side going away. The response and
/// the runtime driving its socket are dropped when this returns.
fn read_body(
    runtime: Runtime,
    mut response: Response,
    tx: Sender<Vec<u8>>,
    stop: CancellationToken,
) {
    runtime.block_on(async move {
        loop {
            let next = tokio::select! {
                biased;
                _ = stop.cancelled() => {
                    trace!("body reader cancelled");
                    return;
                }
                next = response.chunk() => next,
            };
            match next {
                Ok(Some(chunk)) => {
                    if tx.send(chunk.to_vec()).is_err() {
                        return;
                    }
                }
                Ok(None) => {
                    trace!("response body finished");
                    return;
                }
                Err(e) => {
                    debug!(error = %e, "response body read failed");
                    return;
                }
            }
        }
    });
}
