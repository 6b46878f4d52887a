//! Pointer gestures mapped onto an integer-zoom map.

/// Touch movement below this many pixels still counts as a tap.
pub const TOUCH_TAP_THRESHOLD: f64 = 8.0;

/// Finger spread ratio that changes zoom by one level during a pinch.
pub const PINCH_STEP_RATIO: f64 = 1.5;

/// Quiet period that ends a burst of wheel events.
pub const WHEEL_SETTLE_MS: u32 = 80;

pub const PAN_ANIMATION_MS: f64 = 250.0;
pub const ANIMATION_FRAME_MS: u32 = 16;

pub fn point_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - b.0).hypot(a.1 - b.1)
}

pub fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Zoom direction: one level in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomStep {
    In,
    Out,
}

/// Two-finger pinch turned into whole zoom levels. The reference spread
/// resets after every step so one long pinch can cross several levels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pinch {
    reference: f64,
}

impl Pinch {
    pub fn new(distance: f64) -> Self {
        Self {
            reference: distance,
        }
    }

    pub fn update(&mut self, distance: f64) -> Option<ZoomStep> {
        if self.reference < 1.0 {
            self.reference = distance;
            return None;
        }
        let ratio = distance / self.reference;
        let step = if ratio >= PINCH_STEP_RATIO {
            ZoomStep::In
        } else if ratio <= 1.0 / PINCH_STEP_RATIO {
            ZoomStep::Out
        } else {
            return None;
        };
        self.reference = distance;
        Some(step)
    }
}

/// Lets the first event of a wheel burst zoom and swallows the rest until
/// the wheel has been quiet for [`WHEEL_SETTLE_MS`]. Trackpads fire dozens of
/// small deltas per gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelGate {
    in_burst: bool,
}

impl WheelGate {
    pub fn push(&mut self, delta_y: f64) -> Option<ZoomStep> {
        if self.in_burst || delta_y == 0.0 {
            return None;
        }
        self.in_burst = true;
        Some(if delta_y < 0.0 {
            ZoomStep::In
        } else {
            ZoomStep::Out
        })
    }

    /// The wheel went quiet; the next event starts a new burst.
    pub fn settle(&mut self) {
        self.in_burst = false;
    }
}

/// A screen-pixel pan spread over `duration_ms` with ease-out timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanAnimation {
    total: (f64, f64),
    applied: (f64, f64),
    duration_ms: f64,
}

impl PanAnimation {
    pub fn new(dx: f64, dy: f64, duration_ms: f64) -> Self {
        Self {
            total: (dx, dy),
            applied: (0.0, 0.0),
            duration_ms,
        }
    }

    /// Pan still owed at `elapsed_ms` since the start, net of earlier steps.
    pub fn step(&mut self, elapsed_ms: f64) -> (f64, f64) {
        let t = if self.duration_ms > 0.0 {
            (elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let eased = t * (2.0 - t);
        let target = (self.total.0 * eased, self.total.1 * eased);
        let delta = (target.0 - self.applied.0, target.1 - self.applied.1);
        self.applied = target;
        delta
    }

    pub fn is_done(&self, elapsed_ms: f64) -> bool {
        elapsed_ms >= self.duration_ms
    }
}
