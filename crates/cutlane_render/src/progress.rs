use cutlane_core::TimeMs;
use serde::{Deserialize, Serialize};

/// Progress update while the encoder runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportProgress {
    pub percent: f64,
    pub time: TimeMs,
    pub frame: u64,
    pub fps: f64,
    /// Encoding speed relative to real time.
    pub speed: Option<f64>,
    pub eta: Option<TimeMs>,
}

/// Parse an encoder stderr status line.
///
/// Example: `frame=  123 fps= 60 q=28.0 size=1024kB time=00:01:02.05 bitrate=... speed=1.50x`
pub fn parse_progress(line: &str, total: TimeMs) -> Option<ExportProgress> {
    let time = TimeMs::from_seconds(extract_value(line, "time=").and_then(parse_clock)?);

    let frame = extract_value(line, "frame=")
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let fps = extract_value(line, "fps=")
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0);
    let speed = extract_value(line, "speed=")
        .and_then(|v| v.trim_end_matches('x').parse::<f64>().ok())
        .filter(|s| *s > 0.0);

    let percent = if total > TimeMs::ZERO {
        (time.0 as f64 / total.0 as f64 * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let eta = match speed {
        Some(s) if total > time => Some(TimeMs(((total - time).0 as f64 / s).round() as i64)),
        _ => None,
    };

    Some(ExportProgress {
        percent,
        time,
        frame,
        fps,
        speed,
        eta,
    })
}

fn extract_value<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let start = line.find(key)? + key.len();
    let rest = line[start..].trim_start();
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let value = &rest[..end];
    (!value.is_empty()).then_some(value)
}

/// `HH:MM:SS.cc` to seconds. `N/A` and malformed values give `None`.
fn parse_clock(s: &str) -> Option<f64> {
    let mut parts = s.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let mins: f64 = parts.next()?.parse().ok()?;
    let secs: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + mins * 60.0 + secs)
}
