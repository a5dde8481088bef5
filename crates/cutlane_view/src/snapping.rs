use crate::geometry::Point;
use crate::scale::TimeScale;
use cutlane_core::{ClipId, TimeMs};
use serde::{Deserialize, Serialize};

/// Where a dragged clip would land. Nothing is committed until the caller
/// hands this to `Sequence::move_clip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedPlacement {
    pub clip_id: ClipId,
    pub start: TimeMs,
    pub track_index: usize,
}

/// Snap a block's top-left corner during a drag.
///
/// x snaps to a grid of `pixels_per_second / snap_divisor` pixels, y to the
/// nearest track band. Both are clamped to zero.
pub fn snap_position(raw: Point, scale: &TimeScale, track_height: f64, snap_divisor: f64) -> Point {
    let divisor = if snap_divisor > 0.0 { snap_divisor } else { 1.0 };
    let grid = scale.pixels_per_second() / divisor;
    let x = (raw.x / grid).round() * grid;
    let y = if track_height > 0.0 {
        (raw.y / track_height).round() * track_height
    } else {
        raw.y
    };
    Point::new(x.max(0.0), y.max(0.0))
}

/// Track band under a vertical coordinate.
pub fn track_at(y: f64, track_height: f64) -> usize {
    if track_height <= 0.0 {
        return 0;
    }
    (y.max(0.0) / track_height).round() as usize
}

/// Turn a snapped position into a model placement.
pub fn placement_for(clip_id: ClipId, snapped: Point, scale: &TimeScale, track_height: f64) -> ProposedPlacement {
    ProposedPlacement {
        clip_id,
        start: scale.x_to_time(snapped.x).non_negative(),
        track_index: track_at(snapped.y, track_height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn snaps_to_grid_and_track_band() {
        let scale = TimeScale::new(100.0);
        let p = snap_position(Point::new(247.0, 83.0), &scale, 40.0, 10.0);
        assert_eq!(p, Point::new(250.0, 80.0));
    }

    #[test]
    fn finer_divisor_gives_finer_grid() {
        let scale = TimeScale::new(100.0);
        let p = snap_position(Point::new(247.4, 83.0), &scale, 40.0, 100.0);
        assert_eq!(p, Point::new(247.0, 80.0));
    }

    #[test]
    fn negative_positions_clamp_to_zero() {
        let scale = TimeScale::new(100.0);
        let p = snap_position(Point::new(-37.0, -55.0), &scale, 40.0, 10.0);
        assert_eq!(p, Point::new(0.0, 0.0));
    }

    #[test]
    fn grid_follows_zoom() {
        let scale = TimeScale::new(400.0);
        // 40px grid = 100ms
        let p = snap_position(Point::new(61.0, 0.0), &scale, 40.0, 10.0);
        assert_eq!(p.x, 80.0);
    }

    #[test]
    fn placement_converts_to_time_and_track() {
        let scale = TimeScale::new(100.0);
        let id = Uuid::new_v4();
        let placement = placement_for(id, Point::new(250.0, 80.0), &scale, 40.0);
        assert_eq!(placement.clip_id, id);
        assert_eq!(placement.start, TimeMs(2_500));
        assert_eq!(placement.track_index, 2);
    }

    #[test]
    fn track_at_rounds_to_nearest_band() {
        assert_eq!(track_at(0.0, 40.0), 0);
        assert_eq!(track_at(19.0, 40.0), 0);
        assert_eq!(track_at(21.0, 40.0), 1);
        assert_eq!(track_at(-10.0, 40.0), 0);
    }
}
