//! Stream notifications
//!
//! `EventBus` broadcasts discrete `StreamEvent`s to any number of
//! subscribers. Emitting never blocks; subscribers that went away are
//! dropped on the next emit.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

/// Discrete events broadcast to subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// `icy-name` announced by the server
    StationName(String),
    /// New `StreamTitle` from the metadata stream
    StreamTitle(String),
    /// The body was fully delivered; the session has been torn down
    EndOfStream { url: String },
    /// The session was aborted mid-stream
    StreamFailed { url: String, reason: String },
}

/// Broadcast mechanism for stream events
pub struct EventBus {
    subscribers: Mutex<Vec<Sender<StreamEvent>>>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create a new event bus with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to events. Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> Receiver<StreamEvent> {
        let (tx, rx) = unbounded();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    /// Emit an event to all subscribers. Removes disconnected subscribers.
    pub fn emit(&self, event: StreamEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|subs| subs.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_subscriber_receives() {
        let bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.emit(StreamEvent::StationName("Test FM".into()));
        assert_eq!(a.try_recv().unwrap(), StreamEvent::StationName("Test FM".into()));
        assert_eq!(b.try_recv().unwrap(), StreamEvent::StationName("Test FM".into()));
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new();
        bus.emit(StreamEvent::StreamTitle("early".into()));
        let rx = bus.subscribe();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_subscriber_is_pruned() {
        let bus = EventBus::new();
        let keep = bus.subscribe();
        drop(bus.subscribe());
        assert_eq!(bus.subscriber_count(), 2);
        bus.emit(StreamEvent::EndOfStream { url: "http://x/".into() });
        assert_eq!(bus.subscriber_count(), 1);
        assert!(keep.try_recv().is_ok());
    }

    #[test]
    fn emit_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        bus.emit(StreamEvent::StreamFailed {
            url: "http://x/".into(),
            reason: "boom".into(),
        });
        assert_eq!(bus.subscriber_count(), 0);
    }
}
