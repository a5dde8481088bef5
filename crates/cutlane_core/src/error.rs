use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Clip not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("Track not found: {0}")]
    TrackNotFound(usize),

    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error("Command was never executed: {0}")]
    NotExecuted(&'static str),
}

impl CoreError {
    /// True for the "unknown clip or track" family of errors.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_) | CoreError::TrackNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
