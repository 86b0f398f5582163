//! Drag and pinch gesture sessions.
//!
//! A session spans many input events. Every session remembers the
//! viewport state it started from so it can be aborted as a whole:
//! `cancel` restores that snapshot, leaving no partial pan or zoom behind.
//! Ending a session normally keeps whatever was applied.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display};

use crate::{RelativePoint, ViewBox, ViewportController, ViewportState};

/// A point in client (screen pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn midpoint(self, other: Self) -> Self {
        Self {
            x: f64::midpoint(self.x, other.x),
            y: f64::midpoint(self.y, other.y),
        }
    }
}

/// The rendered element's client rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ElementRect {
    /// Converts a client point into a fraction of the element.
    ///
    /// An element without area maps everything to its centre.
    #[must_use]
    pub fn relative(&self, point: ScreenPoint) -> RelativePoint {
        if self.width <= 0.0 || self.height <= 0.0 {
            return RelativePoint::CENTER;
        }
        RelativePoint {
            x: (point.x - self.left) / self.width,
            y: (point.y - self.top) / self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

/// Observable session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GesturePhase {
    Idle,
    Panning,
    Pinching,
}

#[derive(Debug, Clone, Copy, Default)]
enum GestureState {
    #[default]
    Idle,
    Panning {
        last: ScreenPoint,
        snapshot: ViewportState,
    },
    Pinching {
        last_distance: f64,
        snapshot: ViewportState,
    },
}

/// Gesture state machine for one map instance.
#[derive(Debug, Clone, Default)]
pub struct GestureSession {
    state: GestureState,
}

impl GestureSession {
    #[must_use]
    pub const fn phase(&self) -> GesturePhase {
        match self.state {
            GestureState::Idle => GesturePhase::Idle,
            GestureState::Panning { .. } => GesturePhase::Panning,
            GestureState::Pinching { .. } => GesturePhase::Pinching,
        }
    }

    /// Pointer pressed. Only a primary press from idle starts a pan.
    pub fn press(
        &mut self,
        viewport: &ViewportController,
        button: PointerButton,
        at: ScreenPoint,
    ) -> bool {
        if button != PointerButton::Primary || !matches!(self.state, GestureState::Idle) {
            return false;
        }
        self.state = GestureState::Panning {
            last: at,
            snapshot: viewport.state(),
        };
        true
    }

    /// Pointer moved. Pans by the delta since the previous sample.
    pub fn pointer_move(
        &mut self,
        viewport: &mut ViewportController,
        view_box: &ViewBox,
        at: ScreenPoint,
    ) -> bool {
        let GestureState::Panning { last, .. } = &mut self.state else {
            return false;
        };
        viewport.pan_by(view_box, at.x - last.x, at.y - last.y);
        *last = at;
        true
    }

    /// Pointer released: the pan so far is kept.
    pub fn release(&mut self) {
        if matches!(self.state, GestureState::Panning { .. }) {
            self.state = GestureState::Idle;
        }
    }

    /// Aborts the current session, restoring the viewport to where it
    /// was when the session began.
    pub fn cancel(&mut self, viewport: &mut ViewportController) {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => {}
            GestureState::Panning { snapshot, .. } | GestureState::Pinching { snapshot, .. } => {
                log::debug!("Gesture aborted, restoring viewport");
                viewport.restore(snapshot);
            }
        }
    }

    /// Moves the rollback point of a running session to the current
    /// viewport. Zooms applied outside the gesture call this so a later
    /// cancel does not undo them.
    pub const fn rebase(&mut self, viewport: &ViewportController) {
        match &mut self.state {
            GestureState::Idle => {}
            GestureState::Panning { snapshot, .. } | GestureState::Pinching { snapshot, .. } => {
                *snapshot = viewport.state();
            }
        }
    }

    /// Touches went down. Two or more touches start a pinch; a pan in
    /// progress is committed first. Extra touches during a pinch restart
    /// the distance sampling but keep the session's rollback point.
    pub fn touch_start(&mut self, viewport: &mut ViewportController, touches: &[ScreenPoint]) {
        let [a, b, ..] = touches else {
            return;
        };
        let distance = a.distance(*b);
        if !(distance.is_finite() && distance > 0.0) {
            self.cancel(viewport);
            return;
        }
        let snapshot = match self.state {
            GestureState::Pinching { snapshot, .. } => snapshot,
            GestureState::Idle | GestureState::Panning { .. } => viewport.state(),
        };
        self.state = GestureState::Pinching {
            last_distance: distance,
            snapshot,
        };
    }

    /// Touches moved. While pinching, zooms by the distance ratio anchored
    /// at the touch midpoint. A zero distance aborts the session.
    pub fn touch_move(
        &mut self,
        viewport: &mut ViewportController,
        view_box: &ViewBox,
        element: &ElementRect,
        touches: &[ScreenPoint],
    ) -> bool {
        let GestureState::Pinching { last_distance, .. } = self.state else {
            return false;
        };
        let [a, b, ..] = touches else {
            return false;
        };
        let distance = a.distance(*b);
        if !(distance.is_finite() && distance > 0.0) {
            self.cancel(viewport);
            return false;
        }

        let anchor = element.relative(a.midpoint(*b));
        let changed = viewport.zoom_at(view_box, anchor, distance / last_distance);
        if let GestureState::Pinching { last_distance, .. } = &mut self.state {
            *last_distance = distance;
        }
        changed
    }

    /// Touches lifted; `remaining` is how many are still down. A pinch
    /// ends, keeping its zoom, once fewer than two remain.
    pub fn touch_end(&mut self, remaining: usize) {
        if remaining < 2 && matches!(self.state, GestureState::Pinching { .. }) {
            self.state = GestureState::Idle;
        }
    }
}
