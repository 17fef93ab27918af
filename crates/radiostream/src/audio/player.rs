//! Stream player
//!
//! The public face of the session engine. Holds at most one live
//! `StreamSession`, drives it from the caller's loop through `pump`, and
//! reports station names, titles and session endings on an `EventBus`.

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::config::{audio, SessionConfig};
use crate::error::{ConnectError, StreamError};
use crate::stream::negotiate::negotiate;
use crate::stream::{
    Codec, Connector, HttpConnector, Negotiated, OpenOptions, PumpOutcome, StreamSession,
};

use super::events::{EventBus, StreamEvent};
use super::sink::AudioSink;

/// Single-session player driving an `AudioSink`
pub struct StreamPlayer<K: AudioSink, C: Connector = HttpConnector> {
    sink: K,
    connector: C,
    config: SessionConfig,
    session: Option<StreamSession>,
    events: EventBus,
    volume: u8,
}

impl<K: AudioSink> StreamPlayer<K, HttpConnector> {
    /// Player over real HTTP with default settings
    pub fn new(sink: K) -> Self {
        Self::with_connector(sink, HttpConnector::new(), SessionConfig::default())
    }

    pub fn with_config(sink: K, config: SessionConfig) -> Self {
        Self::with_connector(sink, HttpConnector::new(), config)
    }
}

impl<K: AudioSink, C: Connector> StreamPlayer<K, C> {
    /// The sink receives the initial volume immediately.
    pub fn with_connector(mut sink: K, connector: C, config: SessionConfig) -> Self {
        sink.set_volume(audio::INITIAL_VOLUME);
        Self {
            sink,
            connector,
            config,
            session: None,
            events: EventBus::new(),
            volume: audio::INITIAL_VOLUME,
        }
    }

    /// Open `url` with no credentials or range
    pub fn open(&mut self, url: &str) -> Result<Negotiated, ConnectError> {
        self.open_with(url, OpenOptions::default())
    }

    /// Negotiate `url` and make it the live session.
    ///
    /// Fails with `AlreadyActive` while a session is live, leaving that
    /// session untouched. `options` are used for this call only.
    pub fn open_with(&mut self, url: &str, options: OpenOptions) -> Result<Negotiated, ConnectError> {
        if self.session.is_some() {
            warn!(url, "open refused, a stream is already running");
            return Err(ConnectError::AlreadyActive);
        }

        debug!(url, "connecting");
        let (negotiated, connection) =
            negotiate(&mut self.connector, url, &options, &self.config)?;

        if let Some(name) = &negotiated.station_name {
            self.events.emit(StreamEvent::StationName(name.clone()));
        }
        info!(
            url = %negotiated.url,
            codec = %negotiated.codec,
            station = negotiated.station_name.as_deref().unwrap_or(""),
            "stream opened"
        );

        self.session = Some(StreamSession::new(negotiated.clone(), connection, &self.config));
        Ok(negotiated)
    }

    /// Advance the live session; a no-op when idle.
    ///
    /// Completion tears the session down and emits `EndOfStream`. A decoding
    /// error tears it down, emits `StreamFailed` and is returned.
    pub fn pump(&mut self) -> Result<(), StreamError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        match session.pump(&mut self.sink, &self.events) {
            Ok(PumpOutcome::Finished) => {
                let url = session.url().to_string();
                self.stop();
                self.events.emit(StreamEvent::EndOfStream { url });
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                let url = session.url().to_string();
                warn!(%url, error = %e, "stream aborted");
                self.stop();
                self.events.emit(StreamEvent::StreamFailed {
                    url,
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Tear down the live session. Safe to call when idle.
    pub fn stop(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.sink.stop();
            session.close();
            debug!(url = session.url(), "stream closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Set the output volume, clamped to 0-100
    pub fn set_volume(&mut self, level: u8) {
        let level = level.min(audio::MAX_VOLUME);
        self.volume = level;
        self.sink.set_volume(level);
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    /// Codec of the live session, `Unknown` when idle
    pub fn current_codec(&self) -> Codec {
        self.session
            .as_ref()
            .map_or(Codec::Unknown, |s| s.negotiated().codec)
    }

    pub fn current_url(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.url())
    }

    pub fn station_name(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.negotiated().station_name.as_deref())
    }

    pub fn negotiated(&self) -> Option<&Negotiated> {
        self.session.as_ref().map(|s| s.negotiated())
    }

    /// Receiver for all events emitted from now on
    pub fn subscribe(&self) -> Receiver<StreamEvent> {
        self.events.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut K {
        &mut self.sink
    }
}

impl<K: AudioSink, C: Connector> Drop for StreamPlayer<K, C> {
    fn drop(&mut self) {
        self.stop();
    }
}
