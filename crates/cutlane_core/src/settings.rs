//! Editor configuration.
//!
//! Every field has a default, so a settings file only needs to name what it
//! changes.

use crate::error::Result;
use crate::types::TimeMs;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EditorSettings {
    pub view: ViewSettings,
    pub playback: PlaybackSettings,
    pub export: ExportSettings,
}

impl EditorSettings {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewSettings {
    pub pixels_per_second: f64,
    pub track_height: f64,
    /// Horizontal snap grid is `pixels_per_second / snap_divisor` pixels.
    pub snap_divisor: f64,
    pub min_scene_width: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            pixels_per_second: 100.0,
            track_height: 40.0,
            snap_divisor: 10.0,
            min_scene_width: 2000.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

/// Which clips feed the play queue.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QueueSource {
    /// Every track, merged by timeline start.
    #[default]
    AllTracks,
    /// Only the first track (`V1`).
    PrimaryTrack,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    pub nudge_step_ms: i64,
    pub tick_interval_ms: u64,
    pub min_sequence_duration_ms: i64,
    pub queue_source: QueueSource,
}

impl PlaybackSettings {
    pub fn min_sequence_duration(&self) -> TimeMs {
        TimeMs(self.min_sequence_duration_ms)
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            nudge_step_ms: 1_000,
            tick_interval_ms: 33,
            min_sequence_duration_ms: 60_000,
            queue_source: QueueSource::AllTracks,
        }
    }
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportSettings {
    /// Encoder executable, looked up on `PATH`.
    pub encoder: String,
    /// Media inspector used to learn source lengths.
    pub probe: String,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub video_codec: String,
    pub crf: u32,
    pub audio_codec: String,
    pub sample_rate: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        preset_1080p()
    }
}

fn preset(width: u32, height: u32, fps: f64) -> ExportSettings {
    ExportSettings {
        encoder: "ffmpeg".to_string(),
        probe: "ffprobe".to_string(),
        width,
        height,
        fps,
        video_codec: "libx264".to_string(),
        crf: 23,
        audio_codec: "aac".to_string(),
        sample_rate: 44_100,
    }
}

/// 1920x1080 30fps.
pub fn preset_1080p() -> ExportSettings {
    preset(1920, 1080, 30.0)
}

/// 1280x720 30fps.
pub fn preset_720p() -> ExportSettings {
    preset(1280, 720, 30.0)
}

/// 1080x1920 30fps (vertical).
pub fn preset_shorts() -> ExportSettings {
    preset(1080, 1920, 30.0)
}

/// Look up a preset by its CLI name.
pub fn preset_by_name(name: &str) -> Option<ExportSettings> {
    match name {
        "1080p" => Some(preset_1080p()),
        "720p" => Some(preset_720p()),
        "shorts" => Some(preset_shorts()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_editor_behaviour() {
        let s = EditorSettings::default();
        assert_eq!(s.view.pixels_per_second, 100.0);
        assert_eq!(s.view.track_height, 40.0);
        assert_eq!(s.playback.nudge_step_ms, 1_000);
        assert_eq!(s.playback.min_sequence_duration(), TimeMs(60_000));
        assert_eq!(s.playback.queue_source, QueueSource::AllTracks);
        assert_eq!(s.export.encoder, "ffmpeg");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let json = r#"{ "view": { "pixels_per_second": 250.0 }, "playback": { "queue_source": "primary_track" } }"#;
        let s: EditorSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.view.pixels_per_second, 250.0);
        assert_eq!(s.view.track_height, 40.0);
        assert_eq!(s.playback.queue_source, QueueSource::PrimaryTrack);
        assert_eq!(s.export, ExportSettings::default());
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut s = EditorSettings::default();
        s.export = preset_shorts();
        s.save_to_file(&path).unwrap();
        assert_eq!(EditorSettings::load_from_file(&path).unwrap(), s);
    }

    #[test]
    fn presets_by_name() {
        assert_eq!(preset_by_name("720p").unwrap().width, 1280);
        assert_eq!(preset_by_name("shorts").unwrap().height, 1920);
        assert!(preset_by_name("8k").is_none());
    }
}
