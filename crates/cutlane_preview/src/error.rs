use cutlane_core::{ClipId, CoreError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("nothing to play: the timeline has no clips")]
    EmptyQueue,

    #[error("failed to load clip {clip_id} ({}): {reason}", path.display())]
    MediaLoad {
        clip_id: ClipId,
        path: PathBuf,
        reason: String,
    },

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("mpv IPC error: {0}")]
    Ipc(String),

    #[error("media engine unavailable: {0}")]
    EngineUnavailable(String),
}

impl PreviewError {
    /// Errors the user can recover from by picking another clip or adding some.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PreviewError::EmptyQueue | PreviewError::MediaLoad { .. })
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;
