//! Drag tracking and snap settling for bottom sheets.
//!
//! A [`SheetController`] turns a press/move/release sequence from the
//! primary pointer into a transient downward drag offset, then settles the
//! sheet into its expanded or minimized resting position on release.
//! Every sheet on screen owns its own controller.

/// Distance in pixels a drag has to exceed to settle minimized.
pub const MINIMIZE_THRESHOLD_PX: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SheetMetrics {
    pub is_dragging: bool,
    pub start_y: f64,
    pub current_y: f64,
    pub is_minimized: bool,
}

/// One active contact point of a pointer or touch event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    pub id: u64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(id: u64, y: f64) -> Self {
        Self { id, y }
    }
}

/// Whether a header tap was swallowed by the sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// The sheet expanded; the tap must not reach anything beneath the header.
    Consumed,
    /// The sheet ignored the tap.
    PassedThrough,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetController {
    metrics: SheetMetrics,
    threshold: f64,
    primary: Option<u64>,
}

impl Default for SheetController {
    fn default() -> Self {
        Self::new(MINIMIZE_THRESHOLD_PX)
    }
}

impl SheetController {
    pub fn new(threshold: f64) -> Self {
        Self {
            metrics: SheetMetrics::default(),
            threshold,
            primary: None,
        }
    }

    pub fn metrics(&self) -> SheetMetrics {
        self.metrics
    }

    pub fn is_minimized(&self) -> bool {
        self.metrics.is_minimized
    }

    pub fn is_dragging(&self) -> bool {
        self.metrics.is_dragging
    }

    /// Begins a drag from the first touch point. Malformed input is ignored.
    pub fn on_drag_start(&mut self, touches: &[TouchPoint]) {
        let Some(touch) = touches.first().filter(|t| t.y.is_finite()) else {
            return;
        };
        self.primary = Some(touch.id);
        self.metrics.is_dragging = true;
        self.metrics.start_y = touch.y;
    }

    /// Follows the tracked point. Upward motion past the start leaves the offset alone.
    pub fn on_drag_move(&mut self, touches: &[TouchPoint]) {
        if !self.metrics.is_dragging {
            return;
        }
        let Some(touch) = self.tracked(touches) else {
            return;
        };
        let delta = touch.y - self.metrics.start_y;
        if delta < 0.0 {
            return;
        }
        self.metrics.current_y = delta;
    }

    /// Settles the sheet and returns whether it ended minimized.
    /// Duplicate end signals are ignored and return `None`.
    pub fn on_drag_end(&mut self) -> Option<bool> {
        if !self.metrics.is_dragging {
            return None;
        }
        let should_minimize = self.metrics.current_y > self.threshold;
        self.metrics.is_minimized = should_minimize;
        self.metrics.is_dragging = false;
        self.metrics.current_y = 0.0;
        self.primary = None;
        Some(should_minimize)
    }

    /// Expands a minimized sheet. While expanded the header does nothing.
    pub fn on_header_tap(&mut self) -> TapOutcome {
        if self.metrics.is_minimized {
            self.metrics.is_minimized = false;
            TapOutcome::Consumed
        } else {
            TapOutcome::PassedThrough
        }
    }

    /// Explicit expand/collapse control. It flips even mid-drag; the drag's
    /// end then decides the final state.
    pub fn toggle_minimized(&mut self) {
        self.metrics.is_minimized = !self.metrics.is_minimized;
    }

    /// Back to expanded and idle, as when the sheet is first shown.
    pub fn reset(&mut self) {
        self.metrics = SheetMetrics::default();
        self.primary = None;
    }

    /// Vertical offset of the sheet's top edge from its expanded position.
    pub fn offset(&self, sheet_height: f64, peek_height: f64) -> f64 {
        if self.metrics.is_dragging {
            self.metrics.current_y.max(0.0)
        } else if self.metrics.is_minimized {
            (sheet_height - peek_height).max(0.0)
        } else {
            0.0
        }
    }

    fn tracked<'a>(&self, touches: &'a [TouchPoint]) -> Option<&'a TouchPoint> {
        let primary = self.primary?;
        touches
            .iter()
            .find(|t| t.id == primary)
            .filter(|t| t.y.is_finite())
    }
}
