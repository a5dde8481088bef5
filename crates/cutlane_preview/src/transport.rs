use cutlane_core::TimeMs;

/// Scrub slider state plus the `current / total` label.
///
/// Value changes made by the user are handed back to the caller as scrub
/// requests. Programmatic updates run with signals blocked so they never
/// loop back into the scrub handler.
#[derive(Debug, Clone)]
pub struct Transport {
    value: TimeMs,
    maximum: TimeMs,
    min_range: TimeMs,
    dragging: bool,
    signals_blocked: bool,
    label: String,
}

impl Transport {
    /// `min_range` keeps the slider usable on short or empty timelines.
    pub fn new(min_range: TimeMs) -> Self {
        let mut transport = Self {
            value: TimeMs::ZERO,
            maximum: min_range,
            min_range,
            dragging: false,
            signals_blocked: false,
            label: String::new(),
        };
        transport.set_label(TimeMs::ZERO, TimeMs::ZERO);
        transport
    }

    pub fn value(&self) -> TimeMs {
        self.value
    }

    pub fn maximum(&self) -> TimeMs {
        self.maximum
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn set_range(&mut self, total: TimeMs) {
        self.maximum = total.max(self.min_range);
        self.value = self.value.min(self.maximum);
    }

    /// Slider grabbed by the user.
    pub fn press(&mut self) {
        self.dragging = true;
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// The user moved the slider. Returns the scrub request, if any.
    pub fn user_set_value(&mut self, v: TimeMs) -> Option<TimeMs> {
        self.set_value(v)
    }

    /// Follow playback. Skipped while the user holds the slider.
    pub fn sync_value(&mut self, v: TimeMs) {
        if self.dragging {
            return;
        }
        self.signals_blocked = true;
        let echoed = self.set_value(v);
        self.signals_blocked = false;
        debug_assert!(echoed.is_none());
    }

    fn set_value(&mut self, v: TimeMs) -> Option<TimeMs> {
        let v = v.non_negative().min(self.maximum);
        if v == self.value {
            return None;
        }
        self.value = v;
        if self.signals_blocked {
            None
        } else {
            Some(v)
        }
    }

    pub fn set_label(&mut self, current: TimeMs, total: TimeMs) {
        self.label = format!("{} / {}", current.clock(), total.clock());
    }
}
