//! Audio subsystem
//!
//! The sink seam the engine feeds, the player facade that drives a
//! session into it, and the events it broadcasts.

pub mod events;
pub mod player;
pub mod sink;

pub use events::{EventBus, StreamEvent};
pub use player::StreamPlayer;
pub use sink::{AudioSink, WriterSink};
