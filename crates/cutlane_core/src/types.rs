use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Length used for layout when a clip's duration is not known yet.
pub const PLACEHOLDER_CLIP_DURATION: TimeMs = TimeMs(5_000);

/// Nominal duration of a fresh sequence.
pub const DEFAULT_SEQUENCE_DURATION: TimeMs = TimeMs(60_000);

pub type ClipId = Uuid;

// ---------------------------------------------------------------------------
// TimeMs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeMs(pub i64);

impl TimeMs {
    pub const ZERO: Self = Self(0);

    pub fn from_seconds(s: f64) -> Self {
        Self((s * 1_000.0).round() as i64)
    }

    pub fn as_seconds(&self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// Clamp negative values to zero.
    pub fn non_negative(self) -> Self {
        Self(self.0.max(0))
    }

    /// `MM:SS.mmm`, the format used by transport labels.
    pub fn clock(&self) -> String {
        let total = self.0.max(0);
        let ms = total % 1_000;
        let secs = (total / 1_000) % 60;
        let mins = total / 60_000;
        format!("{:02}:{:02}.{:03}", mins, secs, ms)
    }
}

impl Add for TimeMs {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for TimeMs {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul<i64> for TimeMs {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self {
        Self(self.0 * rhs)
    }
}

impl Div<i64> for TimeMs {
    type Output = Self;
    fn div(self, rhs: i64) -> Self {
        Self(self.0 / rhs)
    }
}

impl fmt::Display for TimeMs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_ms = self.0.unsigned_abs();
        let ms = total_ms % 1_000;
        let total_secs = total_ms / 1_000;
        let secs = total_secs % 60;
        let total_mins = total_secs / 60;
        let mins = total_mins % 60;
        let hours = total_mins / 60;
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{sign}{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    }
}

// ---------------------------------------------------------------------------
// Clip
// ---------------------------------------------------------------------------

/// A segment of a media source placed on the timeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    #[serde(default = "Uuid::new_v4")]
    pub id: ClipId,
    pub path: PathBuf,
    #[serde(default)]
    pub in_ms: TimeMs,
    #[serde(default)]
    pub out_ms: Option<TimeMs>,
    #[serde(default)]
    pub start_ms_on_timeline: TimeMs,
    #[serde(default)]
    pub track_index: usize,
    /// Full length of the source, once known. Used when `out_ms` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_duration_ms: Option<TimeMs>,
}

impl Clip {
    /// A clip covering the whole source, placed at `start` on track 0.
    pub fn new(path: impl Into<PathBuf>, start: TimeMs) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            in_ms: TimeMs::ZERO,
            out_ms: None,
            start_ms_on_timeline: start,
            track_index: 0,
            source_duration_ms: None,
        }
    }

    pub fn with_range(mut self, in_ms: TimeMs, out_ms: TimeMs) -> Self {
        self.in_ms = in_ms;
        self.out_ms = Some(out_ms);
        self
    }

    pub fn with_source_duration(mut self, duration: TimeMs) -> Self {
        self.source_duration_ms = Some(duration);
        self
    }

    /// `out - in`, falling back to the source length when no out point is set.
    /// `None` when neither is known.
    pub fn effective_duration(&self) -> Option<TimeMs> {
        self.out_ms
            .or(self.source_duration_ms)
            .map(|end| end - self.in_ms)
    }

    /// Duration used for drawing and for sequence length.
    pub fn layout_duration(&self) -> TimeMs {
        match self.effective_duration() {
            Some(d) if d > TimeMs::ZERO => d,
            _ => PLACEHOLDER_CLIP_DURATION,
        }
    }

    pub fn timeline_end(&self) -> TimeMs {
        self.start_ms_on_timeline + self.layout_duration()
    }

    /// Unknown durations are playable: the player reports the real length.
    pub fn is_playable(&self) -> bool {
        self.effective_duration().map_or(true, |d| d > TimeMs::ZERO)
    }

    pub fn display_name(&self) -> String {
        display_name_of(&self.path)
    }
}

pub fn display_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// ---------------------------------------------------------------------------
// Track
// ---------------------------------------------------------------------------

/// Ordered lane of clips. Overlapping clips are allowed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Track {
    pub name: String,
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clips: vec![],
        }
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sequence {
    pub name: String,
    pub duration_ms: TimeMs,
    pub tracks: Vec<Track>,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            name: "Sequence 01".to_string(),
            duration_ms: DEFAULT_SEQUENCE_DURATION,
            tracks: vec![Track::new("V1"), Track::new("V2")],
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
