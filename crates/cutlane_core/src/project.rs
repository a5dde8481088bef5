use crate::error::Result;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PROJECT_EXTENSION: &str = "cutlane";

/// What goes on disk: the sequence plus the media bin.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub sequence: Sequence,
    #[serde(default)]
    pub media_paths: Vec<PathBuf>,
}

impl Project {
    /// Create an empty project around a named sequence.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sequence: Sequence {
                name: name.into(),
                ..Sequence::default()
            },
            media_paths: vec![],
        }
    }

    /// Add a source to the media bin. Returns false if it was already there.
    pub fn import_media(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.media_paths.contains(&path) {
            return false;
        }
        self.media_paths.push(path);
        true
    }

    /// Save as pretty-printed JSON, appending `.cutlane` if missing.
    /// Returns the path actually written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let mut project: Project = serde_json::from_str(&data)?;
        project.sequence.normalize_track_indices();
        Ok(project)
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(PROJECT_EXTENSION) {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(PROJECT_EXTENSION);
        p.set_file_name(name);
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn two_track_project() -> Project {
        let mut project = Project::new("Roundtrip");
        project.import_media("/media/a.mp4");
        project.import_media("/media/b.mov");
        let seq = &mut project.sequence;
        seq.append_clip(
            0,
            Clip::new("/media/a.mp4", TimeMs(0)).with_range(TimeMs(500), TimeMs(2_500)),
        )
        .unwrap();
        seq.append_clip(1, Clip::new("/media/b.mov", TimeMs(1_250)))
            .unwrap();
        seq.append_clip(
            0,
            Clip::new("/media/a.mp4", TimeMs(4_000))
                .with_range(TimeMs(0), TimeMs(1_000))
                .with_source_duration(TimeMs(9_000)),
        )
        .unwrap();
        seq.duration_ms = TimeMs(90_000);
        project
    }

    #[test]
    fn save_load_roundtrip_two_tracks_three_clips() {
        let dir = TempDir::new().unwrap();
        let project = two_track_project();

        let written = project.save_to_file(dir.path().join("edit.cutlane")).unwrap();
        let loaded = Project::load_from_file(&written).unwrap();

        assert_eq!(loaded, project);
        assert_eq!(loaded.sequence.tracks.len(), 2);
        assert_eq!(loaded.sequence.clip_count(), 3);
        let names: Vec<_> = loaded.sequence.tracks.iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["V1", "V2"]);
    }

    #[test]
    fn document_shape_uses_expected_keys() {
        let project = two_track_project();
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["sequence"]["name"], "Roundtrip");
        assert_eq!(value["sequence"]["durationMs"], 90_000);
        assert_eq!(value["sequence"]["tracks"][0]["name"], "V1");
        let clip = &value["sequence"]["tracks"][0]["clips"][0];
        assert_eq!(clip["path"], "/media/a.mp4");
        assert_eq!(clip["inMs"], 500);
        assert_eq!(clip["outMs"], 2_500);
        assert_eq!(clip["startMsOnTimeline"], 0);
        assert_eq!(clip["trackIndex"], 0);
        assert_eq!(value["mediaPaths"][1], "/media/b.mov");
    }

    #[test]
    fn extension_appended_if_missing() {
        let dir = TempDir::new().unwrap();
        let project = Project::new("Ext");
        let written = project.save_to_file(dir.path().join("no_ext")).unwrap();
        assert_eq!(written, dir.path().join("no_ext.cutlane"));
        assert!(written.exists());
    }

    #[test]
    fn load_nonexistent_file_returns_error() {
        let dir = TempDir::new().unwrap();
        assert!(Project::load_from_file(dir.path().join("missing.cutlane")).is_err());
    }

    #[test]
    fn load_repairs_track_indices() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hand_written.cutlane");
        let json = r#"{
            "sequence": {
                "name": "Hand",
                "durationMs": 60000,
                "tracks": [
                    { "name": "V1", "clips": [] },
                    { "name": "V2", "clips": [
                        { "path": "/m/x.mp4", "inMs": 0, "outMs": 1000, "startMsOnTimeline": 0, "trackIndex": 0 }
                    ] }
                ]
            }
        }"#;
        std::fs::write(&path, json).unwrap();
        let loaded = Project::load_from_file(&path).unwrap();
        assert_eq!(loaded.sequence.tracks[1].clips[0].track_index, 1);
        assert!(loaded.media_paths.is_empty());
    }

    #[test]
    fn import_media_deduplicates() {
        let mut project = Project::default();
        assert!(project.import_media("/media/a.mp4"));
        assert!(!project.import_media("/media/a.mp4"));
        assert_eq!(project.media_paths.len(), 1);
    }
}
