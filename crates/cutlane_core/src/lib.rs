//! Sequence model for the cutlane editor: clips on tracks, editing,
//! undo history, project files and settings.

pub mod editing;
pub mod error;
pub mod history;
pub mod project;
pub mod settings;
pub mod types;

pub use error::{CoreError, Result};
pub use project::Project;
pub use settings::{EditorSettings, QueueSource};
pub use types::{Clip, ClipId, Sequence, TimeMs, Track};
