use crate::geometry::Point;
use crate::scale::TimeScale;
use crate::scene::{build_blocks, build_grid, ClipBlock, Grid, Primitive, Scene, BLOCK_INSET};
use crate::snapping::{placement_for, snap_position, ProposedPlacement};
use cutlane_core::settings::ViewSettings;
use cutlane_core::{ClipId, Sequence, TimeMs};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Notifications a view raises for its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewEvent {
    SelectionChanged(Option<ClipId>),
    /// New order of a flat strip, sent once per completed drag.
    OrderChanged(Vec<ClipId>),
}

#[derive(Debug, Clone)]
struct BlockDrag {
    clip_id: ClipId,
    grab_offset: Point,
    origin: Point,
    current: Point,
}

/// Headless multi-track timeline: owns the zoom, the cached grid, clip
/// blocks, the playhead and the selection. The sequence itself is borrowed
/// for each redraw.
#[derive(Debug, Clone)]
pub struct TimelineView {
    scale: TimeScale,
    track_height: f64,
    snap_divisor: f64,
    min_scene_width: f64,
    grid: Grid,
    grid_generation: u64,
    track_count: usize,
    blocks: Vec<ClipBlock>,
    playhead: TimeMs,
    selected: Option<ClipId>,
    drag: Option<BlockDrag>,
    events: VecDeque<ViewEvent>,
}

impl TimelineView {
    pub fn new(settings: &ViewSettings) -> Self {
        Self {
            scale: TimeScale::new(settings.pixels_per_second),
            track_height: settings.track_height,
            snap_divisor: settings.snap_divisor,
            min_scene_width: settings.min_scene_width,
            grid: Grid::default(),
            grid_generation: 0,
            track_count: 0,
            blocks: Vec::new(),
            playhead: TimeMs::ZERO,
            selected: None,
            drag: None,
            events: VecDeque::new(),
        }
    }

    pub fn scale(&self) -> &TimeScale {
        &self.scale
    }

    pub fn track_height(&self) -> f64 {
        self.track_height
    }

    /// Change the zoom and rebuild everything, since every x depends on it.
    pub fn zoom(&mut self, factor: f64, sequence: &Sequence) {
        self.scale.zoom(factor);
        tracing::debug!(pps = self.scale.pixels_per_second(), "timeline zoom");
        self.redraw_all(sequence);
    }

    /// Grid, ruler and clips.
    pub fn redraw_all(&mut self, sequence: &Sequence) {
        self.grid = build_grid(sequence, &self.scale, self.track_height, self.min_scene_width);
        self.grid_generation += 1;
        self.redraw_clips(sequence);
    }

    /// Clips only; the grid is reused.
    pub fn redraw_clips(&mut self, sequence: &Sequence) {
        if let Some(id) = self.selected {
            if sequence.find_clip_location(id).is_none() {
                self.selected = None;
                self.events.push_back(ViewEvent::SelectionChanged(None));
            }
        }
        self.drag = None;
        self.track_count = sequence.tracks.len();
        self.blocks = build_blocks(sequence, &self.scale, self.track_height, self.selected);
    }

    /// Bumped on every grid rebuild.
    pub fn grid_generation(&self) -> u64 {
        self.grid_generation
    }

    pub fn blocks(&self) -> &[ClipBlock] {
        &self.blocks
    }

    pub fn scene_size(&self) -> (f64, f64) {
        (self.grid.width, self.grid.height)
    }

    // -- playhead ----------------------------------------------------------

    pub fn set_playhead(&mut self, t: TimeMs) {
        self.playhead = t.non_negative();
    }

    pub fn playhead(&self) -> TimeMs {
        self.playhead
    }

    pub fn playhead_x(&self) -> f64 {
        self.scale.time_to_x(self.playhead)
    }

    /// Everything to paint.
    pub fn scene(&self) -> Scene {
        let mut primitives = self.grid.primitives.clone();
        primitives.extend(self.blocks.iter().cloned().map(Primitive::Clip));
        primitives.push(Primitive::Playhead {
            x: self.playhead_x(),
            height: self.grid.height,
        });
        Scene {
            width: self.grid.width,
            height: self.grid.height,
            primitives,
        }
    }

    // -- selection ---------------------------------------------------------

    pub fn selected(&self) -> Option<ClipId> {
        self.selected
    }

    /// Top-most block under a point.
    pub fn block_at(&self, p: Point) -> Option<&ClipBlock> {
        self.blocks.iter().rev().find(|b| b.rect.contains(p))
    }

    /// Select whatever is under the point (or nothing) and report it.
    pub fn click(&mut self, p: Point) -> Option<ClipId> {
        let hit = self.block_at(p).map(|b| b.clip_id);
        self.set_selected(hit);
        self.events.push_back(ViewEvent::SelectionChanged(hit));
        hit
    }

    fn set_selected(&mut self, id: Option<ClipId>) {
        self.selected = id;
        for block in &mut self.blocks {
            block.selected = Some(block.clip_id) == id;
        }
    }

    // -- dragging ----------------------------------------------------------

    /// Press on a block: selects it and starts a drag.
    pub fn begin_drag(&mut self, p: Point) -> Option<ClipId> {
        let id = self.click(p)?;
        let block = self.blocks.iter().find(|b| b.clip_id == id)?;
        let origin = Point::new(block.rect.x, block.rect.y - BLOCK_INSET);
        self.drag = Some(BlockDrag {
            clip_id: id,
            grab_offset: Point::new(p.x - origin.x, p.y - origin.y),
            origin,
            current: origin,
        });
        Some(id)
    }

    /// Pointer moved during a drag. Returns the snapped block origin.
    pub fn drag_to(&mut self, p: Point) -> Option<Point> {
        let drag = self.drag.as_mut()?;
        let raw = Point::new(p.x - drag.grab_offset.x, p.y - drag.grab_offset.y);
        let snapped = snap_position(raw, &self.scale, self.track_height, self.snap_divisor);
        drag.current = snapped;
        let id = drag.clip_id;
        if let Some(block) = self.blocks.iter_mut().find(|b| b.clip_id == id) {
            block.rect.x = snapped.x;
            block.rect.y = snapped.y + BLOCK_INSET;
        }
        Some(snapped)
    }

    /// Release: the proposed placement for the dragged clip. Filler bands
    /// below the last track land on the last track.
    pub fn end_drag(&mut self) -> Option<ProposedPlacement> {
        let drag = self.drag.take()?;
        let mut placement = placement_for(drag.clip_id, drag.current, &self.scale, self.track_height);
        placement.track_index = placement.track_index.min(self.track_count.saturating_sub(1));
        Some(placement)
    }

    /// Abort a drag and put the block back.
    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            if let Some(block) = self.blocks.iter_mut().find(|b| b.clip_id == drag.clip_id) {
                block.rect.x = drag.origin.x;
                block.rect.y = drag.origin.y + BLOCK_INSET;
            }
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Write a placement back to the sequence and redraw the clips. On failure
    /// the blocks are redrawn from the unchanged model.
    pub fn commit(&mut self, sequence: &mut Sequence, placement: ProposedPlacement) -> cutlane_core::Result<()> {
        let result = sequence.move_clip(placement.clip_id, placement.start, placement.track_index);
        if let Err(e) = &result {
            tracing::warn!(clip = %placement.clip_id, "drag rejected: {e}");
        }
        self.redraw_clips(sequence);
        result
    }

    // -- events ------------------------------------------------------------

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        self.events.drain(..).collect()
    }
}
