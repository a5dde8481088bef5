//! Display list for the timeline. A frontend paints these in order; later
//! primitives sit on top of earlier ones.

use crate::geometry::Rect;
use crate::scale::TimeScale;
use cutlane_core::{ClipId, Sequence, TimeMs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fewer tracks than this still draw this many bands.
pub const MIN_BANDS: usize = 3;

/// Vertical gap between a clip block and its band edges.
pub const BLOCK_INSET: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandShade {
    Dark,
    Light,
}

/// One drawn clip, carrying what a frontend needs to label and identify it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipBlock {
    pub display_name: String,
    pub clip_id: ClipId,
    pub source_path: PathBuf,
    pub track_index: usize,
    pub rect: Rect,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Primitive {
    Band { rect: Rect, shade: BandShade },
    GridLine { x: f64, height: f64 },
    RulerLabel { x: f64, y: f64, text: String },
    Clip(ClipBlock),
    Playhead { x: f64, height: f64 },
}

/// A full frame: scene size plus primitives, bottom to top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
}

/// Track bands, second lines and ruler labels. Depends only on the zoom and
/// on the sequence's extent, so it survives clip edits.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Grid {
    pub width: f64,
    pub height: f64,
    pub primitives: Vec<Primitive>,
}

pub fn build_grid(sequence: &Sequence, scale: &TimeScale, track_height: f64, min_width: f64) -> Grid {
    let bands = sequence.tracks.len().max(MIN_BANDS);
    let height = track_height * bands as f64;
    let extent = sequence.total_duration(sequence.duration_ms);
    let content_width = scale.time_to_x(extent);

    let mut primitives = Vec::new();
    for i in 0..bands {
        primitives.push(Primitive::Band {
            rect: Rect::new(0.0, i as f64 * track_height, content_width, track_height),
            shade: if i % 2 == 0 {
                BandShade::Dark
            } else {
                BandShade::Light
            },
        });
    }

    let seconds = extent.0 / 1_000 + 1;
    for s in 0..seconds {
        let x = scale.time_to_x(TimeMs(s * 1_000));
        primitives.push(Primitive::GridLine { x, height });
        primitives.push(Primitive::RulerLabel {
            x: x + 2.0,
            y: 2.0,
            text: format!("{s:02}s"),
        });
    }

    Grid {
        width: content_width.max(min_width),
        height,
        primitives,
    }
}

/// Blocks for every clip in track order, so later clips draw over earlier
/// ones where they overlap.
pub fn build_blocks(
    sequence: &Sequence,
    scale: &TimeScale,
    track_height: f64,
    selected: Option<ClipId>,
) -> Vec<ClipBlock> {
    sequence
        .tracks
        .iter()
        .enumerate()
        .flat_map(|(ti, track)| track.clips.iter().map(move |clip| (ti, clip)))
        .map(|(ti, clip)| ClipBlock {
            display_name: clip.display_name(),
            clip_id: clip.id,
            source_path: clip.path.clone(),
            track_index: ti,
            rect: Rect::new(
                scale.time_to_x(clip.start_ms_on_timeline),
                ti as f64 * track_height + BLOCK_INSET,
                scale.width_of(clip.layout_duration()),
                track_height - 2.0 * BLOCK_INSET,
            ),
            selected: selected == Some(clip.id),
        })
        .collect()
}
