//! MPEG audio frame synchronisation
//!
//! Drops leading bytes of an MP3 body until the first plausible frame
//! header (`0xFF` then a byte carrying the remaining sync bits, a defined
//! version and a defined layer), so the decoder never starts on a partial
//! frame. Skipped bytes are never handed to the sink.

use tracing::{debug, warn};

use crate::audio::sink::AudioSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncState {
    /// Looking for a header; `pending_ff` when the last byte seen was 0xFF
    Searching { pending_ff: bool },
    /// Header found (or search abandoned); bytes pass straight through
    Locked,
}

#[derive(Debug)]
pub struct FrameSync {
    state: SyncState,
    skipped: usize,
    max_scan: usize,
}

/// Second header byte: three sync bits, version not reserved, layer not reserved
pub fn is_frame_header_byte(b: u8) -> bool {
    (b & 0xE0) == 0xE0 && (b & 0x18) != 0x08 && (b & 0x06) != 0x00
}

impl FrameSync {
    /// Search for a frame header, giving up after `max_scan` skipped bytes
    pub fn new(max_scan: usize) -> Self {
        Self {
            state: SyncState::Searching { pending_ff: false },
            skipped: 0,
            max_scan,
        }
    }

    /// Pass everything through from the first byte
    pub fn passthrough() -> Self {
        Self {
            state: SyncState::Locked,
            skipped: 0,
            max_scan: 0,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.state == SyncState::Locked
    }

    /// Bytes discarded before the first frame
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Forward `data` to `sink`, minus anything before the first frame
    /// header. Returns the number of bytes the sink received.
    pub fn feed<K: AudioSink + ?Sized>(&mut self, data: &[u8], sink: &mut K) -> usize {
        let SyncState::Searching { pending_ff } = self.state else {
            sink.feed(data);
            return data.len();
        };
        if data.is_empty() {
            return 0;
        }

        if pending_ff {
            if is_frame_header_byte(data[0]) {
                self.lock();
                sink.feed(&[0xFF]);
                sink.feed(data);
                return data.len() + 1;
            }
            self.skipped += 1;
            self.state = SyncState::Searching { pending_ff: false };
        }

        for i in 0..data.len() {
            if data[i] != 0xFF {
                continue;
            }
            match data.get(i + 1) {
                Some(&next) if is_frame_header_byte(next) => {
                    self.skipped += i;
                    self.lock();
                    sink.feed(&data[i..]);
                    return data.len() - i;
                }
                Some(_) => {}
                None => {
                    self.skipped += i;
                    self.state = SyncState::Searching { pending_ff: true };
                    return 0;
                }
            }
        }

        self.skipped += data.len();
        if self.skipped >= self.max_scan {
            warn!(skipped = self.skipped, "no MPEG frame header found, passing stream through");
            self.state = SyncState::Locked;
        }
        0
    }

    fn lock(&mut self) {
        debug!(skipped = self.skipped, "frame sync found");
        self.state = SyncState::Locked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::mock::RecordingSink;

    #[test]
    fn header_byte_check() {
        assert!(is_frame_header_byte(0xFB)); // MPEG-1 layer III
        assert!(is_frame_header_byte(0xF3)); // MPEG-2 layer III
        assert!(is_frame_header_byte(0xE3)); // MPEG-2.5 layer III
        assert!(!is_frame_header_byte(0xE9)); // reserved version
        assert!(!is_frame_header_byte(0xF9)); // reserved layer
        assert!(!is_frame_header_byte(0x7B));
        assert!(!is_frame_header_byte(0x00));
    }

    #[test]
    fn skips_garbage_before_header() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::new(1024);
        let fed = sync.feed(&[0x12, 0xFF, 0x00, 0x34, 0xFF, 0xFB, 0x90, 0x44], &mut sink);
        assert_eq!(fed, 4);
        assert_eq!(sink.log().fed, vec![0xFF, 0xFB, 0x90, 0x44]);
        assert_eq!(sync.skipped(), 4);
        assert!(sync.is_locked());
    }

    #[test]
    fn passes_everything_after_lock() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::new(1024);
        sync.feed(&[0xFF, 0xFB, 1], &mut sink);
        let fed = sync.feed(&[0x00, 0xFF, 0x00], &mut sink);
        assert_eq!(fed, 3);
        assert_eq!(sink.log().fed, vec![0xFF, 0xFB, 1, 0x00, 0xFF, 0x00]);
    }

    #[test]
    fn header_split_across_feeds() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::new(1024);
        assert_eq!(sync.feed(&[0x01, 0x02, 0xFF], &mut sink), 0);
        assert!(!sync.is_locked());
        assert_eq!(sync.feed(&[0xF3, 0x50], &mut sink), 3);
        assert_eq!(sink.log().fed, vec![0xFF, 0xF3, 0x50]);
        assert_eq!(sync.skipped(), 2);
    }

    #[test]
    fn pending_ff_without_header_is_dropped() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::new(1024);
        sync.feed(&[0xFF], &mut sink);
        assert_eq!(sync.feed(&[0x10, 0xFF, 0xFA], &mut sink), 2);
        assert_eq!(sink.log().fed, vec![0xFF, 0xFA]);
        assert_eq!(sync.skipped(), 2);
    }

    #[test]
    fn gives_up_after_scan_limit() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::new(8);
        assert_eq!(sync.feed(&[0u8; 8], &mut sink), 0);
        assert!(sync.is_locked());
        assert_eq!(sync.feed(&[1, 2], &mut sink), 2);
        assert_eq!(sink.log().fed, vec![1, 2]);
    }

    #[test]
    fn passthrough_never_skips() {
        let mut sink = RecordingSink::new();
        let mut sync = FrameSync::passthrough();
        assert_eq!(sync.feed(&[0, 1, 2], &mut sink), 3);
        assert_eq!(sync.skipped(), 0);
    }
}
