//! Mode controller: which engine's output is authoritative.
//!
//! DESIGN
//! ======
//! The controller starts in `Nearest(AcquiringOrigin)`. Resolving the origin
//! (success or failure) runs the proximity engine and moves to
//! `Nearest(Resolved)`. A completed rectangle draw runs the area engine and
//! moves to `Area`. Reset goes back to `Nearest`, reusing the cached origin
//! when one exists and asking the host to acquire one otherwise.
//!
//! Input handlers return the [`Action`]s the host must carry out (toggle map
//! panning, redraw the rectangle overlay, re-render results, start an origin
//! acquisition). The controller never touches a widget itself.

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use serde::Serialize;
use tracing::debug;

use crate::area::{self, GeoRect};
use crate::draw::{DrawGesture, GestureEvent};
use crate::geo::GeoPoint;
use crate::proximity::{self, OriginError, OriginOutcome};
use crate::record::{Identified, LocationRecord, LocationWithDistance, Positioned, RecordId, SearchSettings};

/// Sub-state of NEAREST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NearestPhase {
    /// Waiting for the one-shot origin acquisition to finish.
    AcquiringOrigin,
    /// Results reflect the latest origin outcome.
    Resolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Mode {
    Nearest { phase: NearestPhase },
    Area { rect: GeoRect },
}

impl Mode {
    #[must_use]
    pub fn is_nearest(&self) -> bool {
        matches!(self, Self::Nearest { .. })
    }

    #[must_use]
    pub fn is_area(&self) -> bool {
        matches!(self, Self::Area { .. })
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nearest { .. } => "nearest",
            Self::Area { .. } => "area",
        }
    }
}

/// Side effects the host carries out after an input.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start a one-shot origin acquisition and report back via `resolve_origin`.
    AcquireOrigin,
    /// Enable or disable map panning.
    SetPanning(bool),
    /// Redraw the rectangle overlay; `None` removes it.
    RectangleChanged(Option<GeoRect>),
    /// The result list changed; re-render markers.
    ResultsChanged,
    ModeChanged(Mode),
}

/// Owned NEAREST/AREA state for one map view.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: Mode,
    settings: SearchSettings,
    pool: Vec<LocationWithDistance>,
    origin: Option<GeoPoint>,
    origin_error: Option<OriginError>,
    results: Vec<LocationWithDistance>,
    distances_valid: bool,
    draw: DrawGesture,
}

impl ModeController {
    #[must_use]
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            mode: Mode::Nearest { phase: NearestPhase::AcquiringOrigin },
            settings: settings.sanitized(),
            pool: Vec::new(),
            origin: None,
            origin_error: None,
            results: Vec::new(),
            distances_valid: false,
            draw: DrawGesture::new(),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// The authoritative result list for the current mode.
    #[must_use]
    pub fn results(&self) -> &[LocationWithDistance] {
        &self.results
    }

    #[must_use]
    pub fn distances_valid(&self) -> bool {
        self.distances_valid
    }

    /// Every known candidate, regardless of mode.
    #[must_use]
    pub fn pool(&self) -> &[LocationWithDistance] {
        &self.pool
    }

    #[must_use]
    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin
    }

    /// Why the last acquisition failed, if it did.
    #[must_use]
    pub fn origin_error(&self) -> Option<OriginError> {
        self.origin_error
    }

    #[must_use]
    pub fn draw(&self) -> &DrawGesture {
        &self.draw
    }

    #[must_use]
    pub fn find(&self, id: i64) -> Option<&LocationRecord> {
        self.pool
            .iter()
            .map(|item| &item.record)
            .find(|record| record.id == RecordId::Assigned(id))
    }

    // --- Data inputs ---

    pub fn set_settings(&mut self, settings: SearchSettings) -> Vec<Action> {
        self.settings = settings.sanitized();
        self.refresh()
    }

    /// Replace the candidate pool and recompute the current view.
    pub fn set_candidates(&mut self, pool: Vec<LocationWithDistance>) -> Vec<Action> {
        self.pool = pool;
        self.annotate_pool();
        self.refresh()
    }

    /// Insert or replace a record the store confirmed as saved.
    pub fn upsert_record(&mut self, record: LocationRecord) -> Vec<Action> {
        let id = record.id;
        let item = LocationWithDistance::from(record);
        match self.pool.iter_mut().find(|existing| !id.is_pending() && existing.identity() == id) {
            Some(existing) => *existing = item,
            None => self.pool.push(item),
        }
        self.annotate_pool();
        self.refresh()
    }

    /// Drop a record the store confirmed as deleted.
    pub fn remove_record(&mut self, id: i64) -> Vec<Action> {
        let before = self.pool.len();
        self.pool.retain(|item| item.identity() != RecordId::Assigned(id));
        if self.pool.len() == before {
            return Vec::new();
        }
        self.refresh()
    }

    // --- Lifecycle ---

    /// Enter `Nearest(AcquiringOrigin)` and ask the host for an origin.
    pub fn start(&mut self) -> Vec<Action> {
        let mut actions: Vec<Action> = self.draw.cancel().into_iter().filter_map(gesture_action).collect();
        if self.mode.is_area() {
            actions.push(Action::RectangleChanged(None));
        }
        actions.extend(self.set_mode(Mode::Nearest { phase: NearestPhase::AcquiringOrigin }));
        actions.push(Action::AcquireOrigin);
        actions
    }

    /// Record an acquisition outcome. Successful origins are cached for reset.
    ///
    /// Only moves the mode when NEAREST is waiting for it; a late outcome in
    /// AREA just updates the cache.
    pub fn resolve_origin(&mut self, outcome: OriginOutcome) -> Vec<Action> {
        match outcome {
            Ok(point) => {
                self.origin = Some(point);
                self.origin_error = None;
            }
            Err(err) => {
                debug!(error = %err, "origin unavailable, using pool order");
                self.origin = None;
                self.origin_error = Some(err);
            }
        }
        self.annotate_pool();

        if self.mode.is_nearest() {
            let mut actions = self.set_mode(Mode::Nearest { phase: NearestPhase::Resolved });
            actions.extend(self.run_nearest());
            return actions;
        }
        Vec::new()
    }

    /// Leave AREA (or refresh NEAREST) using the cached origin if there is one.
    pub fn reset(&mut self) -> Vec<Action> {
        let mut actions: Vec<Action> = self.draw.cancel().into_iter().filter_map(gesture_action).collect();
        if self.mode.is_area() {
            actions.push(Action::RectangleChanged(None));
        }

        if self.origin.is_some() {
            actions.extend(self.set_mode(Mode::Nearest { phase: NearestPhase::Resolved }));
            actions.extend(self.run_nearest());
        } else {
            let acquiring = Mode::Nearest { phase: NearestPhase::AcquiringOrigin };
            // An acquisition already in flight answers through `resolve_origin`.
            if self.mode != acquiring {
                actions.extend(self.set_mode(acquiring));
                actions.push(Action::AcquireOrigin);
            }
        }
        actions
    }

    // --- Drawing ---

    pub fn set_drawing_enabled(&mut self, enabled: bool) -> Vec<Action> {
        let events = self.draw.set_enabled(enabled);
        self.apply_gesture(events)
    }

    pub fn on_pointer_down(&mut self, point: GeoPoint) -> Vec<Action> {
        let events = self.draw.pointer_down(point);
        self.apply_gesture(events)
    }

    pub fn on_pointer_move(&mut self, point: GeoPoint) -> Vec<Action> {
        let events = self.draw.pointer_move(point);
        self.apply_gesture(events)
    }

    pub fn on_pointer_up(&mut self, point: GeoPoint) -> Vec<Action> {
        let events = self.draw.pointer_up(point);
        self.apply_gesture(events)
    }

    /// Run an area query directly, as a completed draw would.
    pub fn select_area(&mut self, rect: GeoRect) -> Vec<Action> {
        debug!(degenerate = rect.is_degenerate(), "area selected");
        let mut actions = self.set_mode(Mode::Area { rect });
        actions.push(Action::RectangleChanged(Some(rect)));
        actions.extend(self.run_area(&rect));
        actions
    }

    // --- Internals ---

    fn apply_gesture(&mut self, events: Vec<GestureEvent>) -> Vec<Action> {
        let mut actions = Vec::new();
        for event in events {
            match event {
                GestureEvent::Completed(rect) => actions.extend(self.select_area(rect)),
                other => actions.extend(gesture_action(other)),
            }
        }
        actions
    }

    fn set_mode(&mut self, mode: Mode) -> Vec<Action> {
        if self.mode == mode {
            return Vec::new();
        }
        self.mode = mode;
        vec![Action::ModeChanged(mode)]
    }

    fn refresh(&mut self) -> Vec<Action> {
        match self.mode {
            Mode::Nearest { phase: NearestPhase::AcquiringOrigin } => Vec::new(),
            Mode::Nearest { phase: NearestPhase::Resolved } => self.run_nearest(),
            Mode::Area { rect } => self.run_area(&rect),
        }
    }

    fn run_nearest(&mut self) -> Vec<Action> {
        let result = proximity::nearest(self.origin, self.pool.iter().cloned(), &self.settings);
        debug!(count = result.items.len(), distances_valid = result.distances_valid, "nearest results");
        self.results = result.items;
        self.distances_valid = result.distances_valid;
        vec![Action::ResultsChanged]
    }

    fn run_area(&mut self, rect: &GeoRect) -> Vec<Action> {
        self.results = area::within(rect, &self.pool);
        self.distances_valid = self.origin.is_some();
        debug!(count = self.results.len(), "area results");
        vec![Action::ResultsChanged]
    }

    /// Keep pool distances in step with the cached origin so AREA results can show them.
    fn annotate_pool(&mut self) {
        let origin = self.origin;
        for item in &mut self.pool {
            item.distance_km = origin.map(|origin| origin.distance_to(item.position()));
        }
    }
}

fn gesture_action(event: GestureEvent) -> Option<Action> {
    match event {
        GestureEvent::Panning(enabled) => Some(Action::SetPanning(enabled)),
        GestureEvent::Preview(rect) => Some(Action::RectangleChanged(rect)),
        GestureEvent::Completed(_) => None,
    }
}
