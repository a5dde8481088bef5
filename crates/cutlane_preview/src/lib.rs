//! Timeline playback: a play queue built from the sequence, a pure
//! controller state machine, and a player that drives a media engine
//! (`mpv` over IPC in production) while keeping the view and transport in
//! sync.

pub mod controller;
pub mod engine;
pub mod error;
pub mod event_loop;
pub mod mpv;
pub mod player;
pub mod queue;
pub mod transport;

#[cfg(test)]
mod testing;

pub use controller::{EngineCommand, PlaybackController, PlaybackMode, PlaybackState};
pub use engine::{EngineEvent, EngineState, MediaEngine};
pub use error::{PreviewError, Result};
pub use event_loop::run_until_finished;
pub use mpv::MpvEngine;
pub use player::Player;
pub use queue::{PlayQueue, QueueEntry};
pub use transport::Transport;
