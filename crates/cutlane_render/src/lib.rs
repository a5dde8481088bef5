//! Export: compiles a sequence into an encoder command line and runs it,
//! plus source probing for clip lengths.

pub mod error;
pub mod export;
pub mod probe;
pub mod progress;

pub use error::{ExportError, Result};
pub use export::{build_encoder_args, compile, execute, ExportPlan, ExportSegment};
pub use probe::{probe_media, MediaInfo};
pub use progress::{parse_progress, ExportProgress};
