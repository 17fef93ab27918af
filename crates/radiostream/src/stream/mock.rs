//! In-memory connector, connection and sink used by unit tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::audio::sink::AudioSink;
use crate::error::{ConnectError, StreamError};
use crate::stream::http::{Connection, Connector, StreamRequest};
use crate::stream::ByteSource;

/// Wire state shared between a `MockConnection` and the test driving it
#[derive(Default)]
pub(crate) struct Wire {
    pub incoming: VecDeque<u8>,
    pub connected: bool,
    pub closed: bool,
}

/// Test-side handle for pushing bytes into a live `MockConnection`
#[derive(Clone)]
pub(crate) struct WireHandle(Rc<RefCell<Wire>>);

impl WireHandle {
    pub fn push(&self, bytes: &[u8]) {
        self.0.borrow_mut().incoming.extend(bytes.iter().copied());
    }

    pub fn hang_up(&self) {
        self.0.borrow_mut().connected = false;
    }

    pub fn was_closed(&self) -> bool {
        self.0.borrow().closed
    }

    pub fn unread(&self) -> usize {
        self.0.borrow().incoming.len()
    }
}

pub(crate) struct MockConnection {
    status: u16,
    headers: Vec<(String, String)>,
    content_length: Option<u64>,
    framed: bool,
    wire: Rc<RefCell<Wire>>,
}

impl MockConnection {
    pub fn new(status: u16) -> (Self, WireHandle) {
        let wire = Rc::new(RefCell::new(Wire {
            connected: true,
            ..Wire::default()
        }));
        (
            Self {
                status,
                headers: Vec::new(),
                content_length: None,
                framed: true,
                wire: wire.clone(),
            },
            WireHandle(wire),
        )
    }

    /// Connection whose whole body has already arrived
    pub fn with_body(body: &[u8]) -> Self {
        let (conn, wire) = Self::new(200);
        wire.push(body);
        conn
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    pub fn prestripped_framing(mut self) -> Self {
        self.framed = false;
        self
    }
}

impl ByteSource for MockConnection {
    fn available(&mut self) -> Result<usize, StreamError> {
        Ok(self.wire.borrow().incoming.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, StreamError> {
        let mut wire = self.wire.borrow_mut();
        let n = buf.len().min(wire.incoming.len());
        for (dst, src) in buf.iter_mut().zip(wire.incoming.drain(..n)) {
            *dst = src;
        }
        Ok(n)
    }

    fn is_exhausted(&mut self) -> bool {
        let wire = self.wire.borrow();
        !wire.connected && wire.incoming.is_empty()
    }
}

impl Connection for MockConnection {
    fn status(&self) -> u16 {
        self.status
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    fn is_connected(&self) -> bool {
        self.wire.borrow().connected
    }

    fn passes_chunk_framing(&self) -> bool {
        self.framed
    }

    fn read_to_string(&mut self, limit: usize) -> Result<String, ConnectError> {
        let mut wire = self.wire.borrow_mut();
        let body: Vec<u8> = wire.incoming.drain(..).take(limit).collect();
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    fn close(&mut self) {
        let mut wire = self.wire.borrow_mut();
        wire.incoming.clear();
        wire.connected = false;
        wire.closed = true;
    }
}

/// A request as the connector saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SeenRequest {
    pub url: String,
    pub request_metadata: bool,
    pub range_start: Option<u64>,
    pub user: Option<String>,
}

/// Connector answering from a script of prepared responses, in order
#[derive(Default)]
pub(crate) struct MockConnector {
    pub responses: VecDeque<Result<MockConnection, ConnectError>>,
    pub requests: Rc<RefCell<Vec<SeenRequest>>>,
    pub offline: bool,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, conn: MockConnection) -> Self {
        self.responses.push_back(Ok(conn));
        self
    }

    pub fn fail(mut self, err: ConnectError) -> Self {
        self.responses.push_back(Err(err));
        self
    }

    pub fn request_log(&self) -> Rc<RefCell<Vec<SeenRequest>>> {
        self.requests.clone()
    }
}

impl Connector for MockConnector {
    fn network_available(&self) -> bool {
        !self.offline
    }

    fn open(&mut self, request: &StreamRequest<'_>) -> Result<Box<dyn Connection>, ConnectError> {
        self.requests.borrow_mut().push(SeenRequest {
            url: request.url.to_string(),
            request_metadata: request.request_metadata,
            range_start: request.range_start,
            user: request.credentials.map(|c| c.user.clone()),
        });
        match self.responses.pop_front() {
            Some(Ok(conn)) => Ok(Box::new(conn)),
            Some(Err(e)) => Err(e),
            None => Err(ConnectError::Transport("no scripted response".to_string())),
        }
    }
}

/// What a `RecordingSink` has been asked to do
#[derive(Debug, Default)]
pub(crate) struct SinkLog {
    pub fed: Vec<u8>,
    pub feeds: Vec<usize>,
    pub starts: usize,
    pub stops: usize,
    pub volume: Option<u8>,
    /// Feeds accepted before reporting not ready; `None` is always ready
    pub ready_for: Option<usize>,
}

/// Sink that records everything and can simulate backpressure
#[derive(Clone, Default)]
pub(crate) struct RecordingSink(pub Rc<RefCell<SinkLog>>);

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::cell::Ref<'_, SinkLog> {
        self.0.borrow()
    }

    pub fn set_ready_for(&self, feeds: Option<usize>) {
        self.0.borrow_mut().ready_for = feeds;
    }
}

impl AudioSink for RecordingSink {
    fn is_ready(&self) -> bool {
        self.0.borrow().ready_for.map_or(true, |n| n > 0)
    }

    fn start(&mut self) {
        self.0.borrow_mut().starts += 1;
    }

    fn stop(&mut self) {
        self.0.borrow_mut().stops += 1;
    }

    fn feed(&mut self, data: &[u8]) {
        let mut log = self.0.borrow_mut();
        log.fed.extend_from_slice(data);
        log.feeds.push(data.len());
        if let Some(n) = log.ready_for.as_mut() {
            *n = n.saturating_sub(1);
        }
    }

    fn set_volume(&mut self, level: u8) {
        self.0.borrow_mut().volume = Some(level);
    }
}
