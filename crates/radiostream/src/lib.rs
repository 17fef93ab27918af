//! Radiostream: internet radio session engine
//!
//! Playlist resolution, chunked transfer unframing, ICY metadata
//! de-interleaving and flow control between an HTTP stream and an audio
//! sink.
//!
//! ## Quick start
//!
//! ```no_run
//! use radiostream::audio::{StreamPlayer, WriterSink};
//!
//! let mut player = StreamPlayer::new(WriterSink::new(std::io::sink()));
//! player.open("http://icecast.omroep.nl/radio1-bb-mp3")?;
//! while player.is_active() {
//!     player.pump()?;
//!     std::thread::sleep(std::time::Duration::from_millis(5));
//! }
//! # Ok::<(), radiostream::error::RadioError>(())
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod presets;
pub mod queue;
pub mod stream;
