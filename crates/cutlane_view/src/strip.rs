//! Single-row clip strip: fixed-size blocks in list order, reordered by
//! dragging, with a thin read-only progress bar above it.

use crate::geometry::{Point, Rect};
use crate::view::ViewEvent;
use cutlane_core::{Clip, ClipId, TimeMs, Track};
use std::collections::VecDeque;

pub const STRIP_BLOCK_WIDTH: f64 = 120.0;
pub const STRIP_BLOCK_HEIGHT: f64 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct StripItem {
    pub clip_id: ClipId,
    pub display_name: String,
}

#[derive(Debug, Clone)]
struct StripDrag {
    from: usize,
    current: usize,
    original: Vec<StripItem>,
}

#[derive(Debug, Clone, Default)]
pub struct ClipStrip {
    items: Vec<StripItem>,
    selected: Option<ClipId>,
    drag: Option<StripDrag>,
    total: TimeMs,
    position: TimeMs,
    events: VecDeque<ViewEvent>,
}

impl ClipStrip {
    pub fn new() -> Self {
        Self {
            total: TimeMs(1),
            ..Default::default()
        }
    }

    pub fn from_track(track: &Track) -> Self {
        let mut strip = Self::new();
        strip.set_clips(&track.clips);
        strip
    }

    /// Replace the contents. Selection is kept when its clip is still present.
    pub fn set_clips(&mut self, clips: &[Clip]) {
        self.items = clips
            .iter()
            .map(|c| StripItem {
                clip_id: c.id,
                display_name: c.display_name(),
            })
            .collect();
        self.drag = None;
        if let Some(id) = self.selected {
            if !self.items.iter().any(|i| i.clip_id == id) {
                self.selected = None;
                self.events.push_back(ViewEvent::SelectionChanged(None));
            }
        }
    }

    pub fn push(&mut self, clip: &Clip) {
        self.items.push(StripItem {
            clip_id: clip.id,
            display_name: clip.display_name(),
        });
    }

    pub fn items(&self) -> &[StripItem] {
        &self.items
    }

    pub fn order(&self) -> Vec<ClipId> {
        self.items.iter().map(|i| i.clip_id).collect()
    }

    pub fn block_rect(&self, index: usize) -> Rect {
        Rect::new(
            index as f64 * STRIP_BLOCK_WIDTH,
            0.0,
            STRIP_BLOCK_WIDTH,
            STRIP_BLOCK_HEIGHT,
        )
    }

    fn index_at(&self, p: Point) -> Option<usize> {
        if p.x < 0.0 || p.y < 0.0 || p.y >= STRIP_BLOCK_HEIGHT {
            return None;
        }
        let index = (p.x / STRIP_BLOCK_WIDTH) as usize;
        (index < self.items.len()).then_some(index)
    }

    // -- selection ---------------------------------------------------------

    pub fn selected(&self) -> Option<ClipId> {
        self.selected
    }

    pub fn click(&mut self, p: Point) -> Option<ClipId> {
        let hit = self.index_at(p).map(|i| self.items[i].clip_id);
        self.selected = hit;
        self.events.push_back(ViewEvent::SelectionChanged(hit));
        hit
    }

    // -- reordering --------------------------------------------------------

    pub fn begin_drag(&mut self, p: Point) -> Option<ClipId> {
        let index = self.index_at(p)?;
        let id = self.items[index].clip_id;
        self.selected = Some(id);
        self.events.push_back(ViewEvent::SelectionChanged(Some(id)));
        self.drag = Some(StripDrag {
            from: index,
            current: index,
            original: self.items.clone(),
        });
        Some(id)
    }

    /// Move the dragged block to the slot under the pointer. The live order
    /// changes, but nothing is reported until the drop.
    pub fn drag_to(&mut self, p: Point) -> Option<usize> {
        let len = self.items.len();
        let drag = self.drag.as_mut()?;
        let slot = if p.x <= 0.0 {
            0
        } else {
            ((p.x / STRIP_BLOCK_WIDTH) as usize).min(len.saturating_sub(1))
        };
        if slot != drag.current {
            let item = self.items.remove(drag.current);
            self.items.insert(slot, item);
            drag.current = slot;
        }
        Some(slot)
    }

    /// Drop: reports the final order exactly once.
    pub fn end_drag(&mut self) -> Option<Vec<ClipId>> {
        let drag = self.drag.take()?;
        let order = self.order();
        tracing::debug!(from = drag.from, to = drag.current, "strip reorder");
        self.events.push_back(ViewEvent::OrderChanged(order.clone()));
        Some(order)
    }

    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            self.items = drag.original;
        }
    }

    // -- progress ----------------------------------------------------------

    /// Total span of the progress bar; never below 1 ms.
    pub fn set_total(&mut self, total: TimeMs) {
        self.total = total.max(TimeMs(1));
        self.position = self.position.min(self.total);
    }

    pub fn set_position(&mut self, position: TimeMs) {
        self.position = position.non_negative().min(self.total);
    }

    pub fn total(&self) -> TimeMs {
        self.total
    }

    pub fn position(&self) -> TimeMs {
        self.position
    }

    /// Progress in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        self.position.0 as f64 / self.total.0 as f64
    }

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        self.events.drain(..).collect()
    }
}
