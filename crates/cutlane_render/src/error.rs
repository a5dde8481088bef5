use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no clips to export")]
    NoClips,

    #[error("encoder not found: {0}")]
    EncoderNotFound(String),

    #[error("encoder failed: {0}")]
    EncoderFailed(String),

    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("media prober not found: {0}")]
    ProberNotFound(String),

    #[error("probe failed: {0}")]
    ProbeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ExportError>;
