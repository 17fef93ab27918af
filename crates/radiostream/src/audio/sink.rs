//! Audio sink seam
//!
//! The decoder downstream of the session engine. The engine only pushes
//! compressed bytes into it and asks whether it wants more.

use std::io::Write;

use tracing::warn;

/// Downstream consumer of compressed audio
pub trait AudioSink {
    /// Willing to accept another chunk right now
    fn is_ready(&self) -> bool;

    /// Begin playback
    fn start(&mut self);

    /// End playback and discard queued audio
    fn stop(&mut self);

    /// Queue a chunk of compressed audio
    fn feed(&mut self, data: &[u8]);

    /// Output volume, 0-100
    fn set_volume(&mut self, level: u8);
}

/// Sink that writes the compressed stream to any `Write`r
///
/// Always ready until a write fails, after which it reports not ready until
/// the next `start`. Volume is recorded but has no effect on the bytes.
pub struct WriterSink<W: Write> {
    writer: W,
    failed: bool,
    playing: bool,
    volume: u8,
    bytes_written: u64,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
            playing: false,
            volume: 0,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> AudioSink for WriterSink<W> {
    fn is_ready(&self) -> bool {
        !self.failed
    }

    fn start(&mut self) {
        self.failed = false;
        self.playing = true;
    }

    fn stop(&mut self) {
        if self.playing {
            if let Err(e) = self.writer.flush() {
                warn!(error = %e, "flushing audio output failed");
            }
        }
        self.playing = false;
    }

    fn feed(&mut self, data: &[u8]) {
        if self.failed {
            return;
        }
        match self.writer.write_all(data) {
            Ok(()) => self.bytes_written += data.len() as u64,
            Err(e) => {
                warn!(error = %e, "writing audio output failed");
                self.failed = true;
            }
        }
    }

    fn set_volume(&mut self, level: u8) {
        self.volume = level;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_fed_bytes() {
        let mut sink = WriterSink::new(Vec::new());
        sink.start();
        sink.feed(b"abc");
        sink.feed(b"de");
        assert_eq!(sink.bytes_written(), 5);
        assert!(sink.is_playing());
        sink.stop();
        assert!(!sink.is_playing());
        assert_eq!(sink.into_inner(), b"abcde");
    }

    #[test]
    fn write_failure_stops_readiness() {
        let mut sink = WriterSink::new(BrokenPipe);
        sink.start();
        assert!(sink.is_ready());
        sink.feed(b"x");
        assert!(!sink.is_ready());
        assert_eq!(sink.bytes_written(), 0);
        sink.start();
        assert!(sink.is_ready());
    }

    #[test]
    fn volume_is_recorded() {
        let mut sink = WriterSink::new(Vec::new());
        sink.set_volume(42);
        assert_eq!(sink.volume(), 42);
    }
}
