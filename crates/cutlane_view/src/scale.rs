use cutlane_core::TimeMs;
use serde::{Deserialize, Serialize};

pub const MIN_PIXELS_PER_SECOND: f64 = 10.0;
pub const MAX_PIXELS_PER_SECOND: f64 = 1000.0;

/// Mapping between timeline time and horizontal pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeScale {
    pixels_per_second: f64,
}

impl TimeScale {
    pub fn new(pixels_per_second: f64) -> Self {
        let mut scale = Self {
            pixels_per_second: 100.0,
        };
        scale.set_pixels_per_second(pixels_per_second);
        scale
    }

    pub fn pixels_per_second(&self) -> f64 {
        self.pixels_per_second
    }

    /// Clamped into `[10, 1000]`. NaN is ignored.
    pub fn set_pixels_per_second(&mut self, pps: f64) {
        if pps.is_nan() {
            return;
        }
        self.pixels_per_second = pps.clamp(MIN_PIXELS_PER_SECOND, MAX_PIXELS_PER_SECOND);
    }

    /// Multiply the zoom by `factor`. Returns true if the scale changed.
    pub fn zoom(&mut self, factor: f64) -> bool {
        if factor.is_nan() {
            return false;
        }
        let before = self.pixels_per_second;
        self.set_pixels_per_second(self.pixels_per_second * factor);
        self.pixels_per_second != before
    }

    pub fn time_to_x(&self, t: TimeMs) -> f64 {
        t.as_seconds() * self.pixels_per_second
    }

    pub fn x_to_time(&self, x: f64) -> TimeMs {
        TimeMs(((x / self.pixels_per_second) * 1000.0).round() as i64)
    }

    /// Width of a span of time.
    pub fn width_of(&self, d: TimeMs) -> f64 {
        self.time_to_x(d)
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::new(100.0)
    }
}
