use crate::error::Result;
use cutlane_core::TimeMs;
use std::path::Path;

/// Coarse engine state as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Playing,
    Paused,
}

/// Something the media backend noticed since the last poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Source length of the loaded file.
    DurationKnown(TimeMs),
    StateChanged(EngineState),
    /// Position within the source file.
    PositionChanged(TimeMs),
    EndOfMedia,
    LoadFailed(String),
}

/// A media backend that plays one source at a time.
pub trait MediaEngine {
    /// Open a file, positioned at `start` within it.
    fn load_source(&mut self, path: &Path, start: TimeMs) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn stop(&mut self) -> Result<()>;

    fn seek(&mut self, position: TimeMs) -> Result<()>;

    /// Drain events observed since the previous call.
    fn poll_events(&mut self) -> Result<Vec<EngineEvent>>;
}
