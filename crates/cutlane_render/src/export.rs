use crate::error::{ExportError, Result};
use crate::progress::{parse_progress, ExportProgress};
use cutlane_core::settings::ExportSettings;
use cutlane_core::{Clip, ClipId, Sequence, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::watch;

/// Non-progress stderr lines kept for error reports.
const STDERR_TAIL: usize = 10;

/// A compiled export ready for the encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPlan {
    pub encoder: String,
    /// Unique source files, in first-use order.
    pub inputs: Vec<PathBuf>,
    pub segments: Vec<ExportSegment>,
    /// Generated silent track, added after the file inputs.
    pub audio_source: String,
    pub filter_graph: String,
    pub output_args: Vec<String>,
    pub output_path: PathBuf,
    /// Expected output length, for progress.
    pub total: TimeMs,
}

/// One clip's slice of the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSegment {
    pub clip_id: ClipId,
    pub input_index: usize,
    pub in_ms: TimeMs,
    /// `None` plays to the end of the source.
    pub out_ms: Option<TimeMs>,
}

/// Clips in the order they appear in the output: timeline start, with track
/// and list order breaking ties. Clips with an empty range are skipped.
fn ordered_clips(sequence: &Sequence) -> Vec<&Clip> {
    let mut clips: Vec<&Clip> = sequence.clips().collect();
    clips.sort_by_key(|c| c.start_ms_on_timeline);
    clips.retain(|c| {
        let keep = c.is_playable();
        if !keep {
            tracing::warn!(clip = %c.id, "skipping clip with empty range");
        }
        keep
    });
    clips
}

/// Compile a sequence into an encoder plan: every clip trimmed, scaled and
/// padded to the output frame, concatenated in order, over a silent stereo
/// track.
pub fn compile(sequence: &Sequence, settings: &ExportSettings, output: impl Into<PathBuf>) -> Result<ExportPlan> {
    let clips = ordered_clips(sequence);
    if clips.is_empty() {
        return Err(ExportError::NoClips);
    }

    let mut path_to_index: HashMap<&Path, usize> = HashMap::new();
    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut segments = Vec::with_capacity(clips.len());
    for clip in &clips {
        let input_index = *path_to_index.entry(clip.path.as_path()).or_insert_with(|| {
            inputs.push(clip.path.clone());
            inputs.len() - 1
        });
        segments.push(ExportSegment {
            clip_id: clip.id,
            input_index,
            in_ms: clip.in_ms,
            out_ms: clip.out_ms.or(clip.source_duration_ms),
        });
    }

    let (w, h, fps) = (settings.width, settings.height, settings.fps);
    let mut filters: Vec<String> = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        let trim = match seg.out_ms {
            Some(out) => format!("trim=start={}:end={}", seg.in_ms.as_seconds(), out.as_seconds()),
            None => format!("trim=start={}", seg.in_ms.as_seconds()),
        };
        filters.push(format!(
            "[{idx}:v]{trim},setpts=PTS-STARTPTS,scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps}[v{i}]",
            idx = seg.input_index,
        ));
    }
    let concat_inputs: String = (0..segments.len()).map(|i| format!("[v{i}]")).collect();
    filters.push(format!("{concat_inputs}concat=n={}:v=1:a=0[outv]", segments.len()));

    let audio_index = inputs.len();
    let output_args = vec![
        "-map".to_string(),
        "[outv]".to_string(),
        "-map".to_string(),
        format!("{audio_index}:a"),
        "-c:v".to_string(),
        settings.video_codec.clone(),
        "-crf".to_string(),
        settings.crf.to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-r".to_string(),
        format!("{fps}"),
        "-c:a".to_string(),
        settings.audio_codec.clone(),
        "-ar".to_string(),
        settings.sample_rate.to_string(),
        "-shortest".to_string(),
    ];

    let total = clips
        .iter()
        .map(|c| c.layout_duration())
        .fold(TimeMs::ZERO, |acc, d| acc + d);

    Ok(ExportPlan {
        encoder: settings.encoder.clone(),
        inputs,
        segments,
        audio_source: format!("anullsrc=channel_layout=stereo:sample_rate={}", settings.sample_rate),
        filter_graph: filters.join(";"),
        output_args,
        output_path: output.into(),
        total,
    })
}

/// Encoder arguments for a plan, without the executable itself.
pub fn build_encoder_args(plan: &ExportPlan) -> Vec<String> {
    let mut args = vec!["-y".to_string()];
    for input in &plan.inputs {
        args.push("-i".to_string());
        args.push(input.to_string_lossy().into_owned());
    }
    args.extend([
        "-f".to_string(),
        "lavfi".to_string(),
        "-i".to_string(),
        plan.audio_source.clone(),
        "-filter_complex".to_string(),
        plan.filter_graph.clone(),
    ]);
    args.extend(plan.output_args.iter().cloned());
    args.push(plan.output_path.to_string_lossy().into_owned());
    args
}

/// Run the encoder for a plan, publishing progress as stderr status lines
/// arrive.
pub async fn execute(
    plan: &ExportPlan,
    settings: &ExportSettings,
    progress_tx: watch::Sender<ExportProgress>,
    total: TimeMs,
) -> Result<()> {
    use std::process::Stdio;
    use tokio::process::Command;

    let args = build_encoder_args(plan);
    tracing::info!(
        encoder = %settings.encoder,
        output = %plan.output_path.display(),
        clips = plan.segments.len(),
        "starting export"
    );

    let mut child = Command::new(&settings.encoder)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExportError::EncoderNotFound(settings.encoder.clone())
            } else {
                ExportError::Io(e)
            }
        })?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ExportError::EncoderFailed("stderr was not captured".into()))?;
    let tail = read_status(stderr, total, &progress_tx).await?;

    let status = child.wait().await?;
    if !status.success() {
        return Err(ExportError::EncoderFailed(format!(
            "{} exited with {status}: {}",
            settings.encoder,
            tail.join(" | ")
        )));
    }
    tracing::info!(output = %plan.output_path.display(), "export finished");
    Ok(())
}

/// Read encoder stderr until it closes. ffmpeg ends status lines with '\r'
/// and log lines with '\n', so either one ends a line. Progress lines go to
/// `progress_tx` immediately; the last other lines are returned.
async fn read_status<R: AsyncRead + Unpin>(
    mut reader: R,
    total: TimeMs,
    progress_tx: &watch::Sender<ExportProgress>,
) -> Result<Vec<String>> {
    let mut chunk = [0u8; 4096];
    let mut line: Vec<u8> = Vec::new();
    let mut tail: VecDeque<String> = VecDeque::new();
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        for &byte in &chunk[..n] {
            if byte == b'\r' || byte == b'\n' {
                finish_line(&mut line, total, progress_tx, &mut tail);
            } else {
                line.push(byte);
            }
        }
    }
    finish_line(&mut line, total, progress_tx, &mut tail);
    Ok(tail.into())
}

fn finish_line(
    line: &mut Vec<u8>,
    total: TimeMs,
    progress_tx: &watch::Sender<ExportProgress>,
    tail: &mut VecDeque<String>,
) {
    let text = String::from_utf8_lossy(line).trim().to_string();
    line.clear();
    if text.is_empty() {
        return;
    }
    match parse_progress(&text, total) {
        Some(progress) => {
            let _ = progress_tx.send(progress);
        }
        None => {
            if tail.len() == STDERR_TAIL {
                tail.pop_front();
            }
            tail.push_back(text);
        }
    }
}
