//! Rectangle-draw gesture: the pointer state machine behind area search.
//!
//! While drawing is enabled a drag sketches a search rectangle:
//! `Idle → Anchored` on pointer-down (map panning suspended),
//! `→ Tracking` on pointer-move (rectangle follows the pointer), and
//! `→ Idle` on pointer-up (rectangle completed, panning resumed).
//!
//! "Panning enabled" is the only exclusive resource here. It is held from
//! pointer-down until pointer-up, and released unconditionally when drawing
//! is disabled mid-gesture; the half-drawn rectangle is then discarded.

#[cfg(test)]
#[path = "draw_test.rs"]
mod draw_test;

use crate::area::GeoRect;
use crate::geo::GeoPoint;

/// Active gesture between pointer-down and pointer-up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Pointer is down but has not moved yet.
    Anchored {
        /// Where the drag started; one corner of the rectangle.
        anchor: GeoPoint,
    },
    /// Pointer is being dragged; the rectangle spans anchor to current.
    Tracking {
        /// Where the drag started.
        anchor: GeoPoint,
        /// Latest pointer position.
        current: GeoPoint,
    },
}

/// What a gesture step produced, for the mode controller to act on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Map panning was suspended (`false`) or resumed (`true`).
    Panning(bool),
    /// The in-progress rectangle changed; `None` when it was discarded.
    Preview(Option<GeoRect>),
    /// The drag finished with this rectangle.
    Completed(GeoRect),
}

/// Owned draw-mode state. Hosts pass it by `&mut` into their pointer handlers.
#[derive(Debug, Clone)]
pub struct DrawGesture {
    enabled: bool,
    state: DrawState,
    panning_enabled: bool,
}

impl Default for DrawGesture {
    fn default() -> Self {
        Self { enabled: false, state: DrawState::Idle, panning_enabled: true }
    }
}

impl DrawGesture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn state(&self) -> DrawState {
        self.state
    }

    #[must_use]
    pub fn panning_enabled(&self) -> bool {
        self.panning_enabled
    }

    /// The rectangle currently being sketched, if any.
    #[must_use]
    pub fn preview(&self) -> Option<GeoRect> {
        match self.state {
            DrawState::Idle => None,
            DrawState::Anchored { anchor } => Some(GeoRect::from_corners(anchor, anchor)),
            DrawState::Tracking { anchor, current } => Some(GeoRect::from_corners(anchor, current)),
        }
    }

    /// Turn drawing mode on or off. Turning it off mid-gesture cancels the gesture.
    pub fn set_enabled(&mut self, enabled: bool) -> Vec<GestureEvent> {
        self.enabled = enabled;
        if enabled {
            return Vec::new();
        }
        self.cancel()
    }

    /// Abandon any gesture in progress and give panning back.
    pub fn cancel(&mut self) -> Vec<GestureEvent> {
        let mut events = Vec::new();
        if self.state != DrawState::Idle {
            self.state = DrawState::Idle;
            events.push(GestureEvent::Preview(None));
        }
        events.extend(self.resume_panning());
        events
    }

    pub fn pointer_down(&mut self, point: GeoPoint) -> Vec<GestureEvent> {
        if !self.enabled || self.state != DrawState::Idle {
            return Vec::new();
        }
        self.state = DrawState::Anchored { anchor: point };
        self.panning_enabled = false;
        vec![GestureEvent::Panning(false), GestureEvent::Preview(self.preview())]
    }

    pub fn pointer_move(&mut self, point: GeoPoint) -> Vec<GestureEvent> {
        let anchor = match self.state {
            DrawState::Idle => return Vec::new(),
            DrawState::Anchored { anchor } | DrawState::Tracking { anchor, .. } => anchor,
        };
        self.state = DrawState::Tracking { anchor, current: point };
        vec![GestureEvent::Preview(self.preview())]
    }

    pub fn pointer_up(&mut self, point: GeoPoint) -> Vec<GestureEvent> {
        let anchor = match self.state {
            DrawState::Idle => return Vec::new(),
            DrawState::Anchored { anchor } | DrawState::Tracking { anchor, .. } => anchor,
        };
        self.state = DrawState::Idle;
        let mut events = self.resume_panning();
        events.push(GestureEvent::Preview(None));
        events.push(GestureEvent::Completed(GeoRect::from_corners(anchor, point)));
        events
    }

    fn resume_panning(&mut self) -> Vec<GestureEvent> {
        if self.panning_enabled {
            return Vec::new();
        }
        self.panning_enabled = true;
        vec![GestureEvent::Panning(true)]
    }
}
