//! Source inspection with `ffprobe`, used to learn clip lengths on import.

use crate::error::{ExportError, Result};
use cutlane_core::TimeMs;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    #[serde(default)]
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// What the editor needs to know about a source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration: Option<TimeMs>,
    pub width: u32,
    pub height: u32,
    pub fps: Option<f64>,
    pub has_audio: bool,
}

/// Run the prober (`ffprobe` by default) on a file.
pub fn probe_media(prober: &str, path: impl AsRef<Path>) -> Result<MediaInfo> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ExportError::FileNotFound(path.to_path_buf()));
    }

    let output = std::process::Command::new(prober)
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .output()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExportError::ProberNotFound(prober.to_string())
            } else {
                ExportError::ProbeFailed(e.to_string())
            }
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExportError::ProbeFailed(format!("{}: {}", path.display(), stderr.trim())));
    }

    let info = parse_probe_json(&output.stdout)?;
    tracing::debug!(path = %path.display(), duration = ?info.duration, "probed");
    Ok(info)
}

pub fn parse_probe_json(json: &[u8]) -> Result<MediaInfo> {
    let probe: ProbeOutput = serde_json::from_slice(json)?;
    let video = probe.streams.iter().find(|s| s.codec_type == "video");

    Ok(MediaInfo {
        duration: probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| *d > 0.0)
            .map(TimeMs::from_seconds),
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
        fps: video
            .and_then(|s| s.r_frame_rate.as_deref())
            .and_then(parse_frame_rate),
        has_audio: probe.streams.iter().any(|s| s.codec_type == "audio"),
    })
}

/// `30000/1001`, `30/1` or a plain number.
fn parse_frame_rate(rate: &str) -> Option<f64> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let n: f64 = num.parse().ok()?;
            let d: f64 = den.parse().ok()?;
            (d != 0.0).then(|| n / d)
        }
        None => rate.parse().ok(),
    }
}
