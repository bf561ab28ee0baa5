//! Bounding-box queries over the known candidate set.
//!
//! Rectangles come from a drag gesture, so the two corners can arrive in
//! any order; [`GeoRect::from_corners`] normalizes them. A zero-width or
//! zero-height rectangle is valid and simply matches little or nothing.
//!
//! Longitude wraparound across ±180° is not handled: a rectangle is always
//! the span between its west and east edges without crossing the
//! antimeridian.

#[cfg(test)]
#[path = "area_test.rs"]
mod area_test;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::record::Positioned;

/// A normalized lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoRect {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoRect {
    /// Normalize two arbitrary corners into north/south/east/west edges.
    #[must_use]
    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        Self {
            north: a.lat.max(b.lat),
            south: a.lat.min(b.lat),
            east: a.lon.max(b.lon),
            west: a.lon.min(b.lon),
        }
    }

    /// Inclusive containment test on all four edges.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.south <= point.lat && point.lat <= self.north && self.west <= point.lon && point.lon <= self.east
    }

    /// Whether the rectangle has zero width or zero height.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.north <= self.south || self.east <= self.west
    }
}

/// Keep the candidates inside `rect`, preserving input order.
///
/// Any distance a candidate carries from an earlier proximity pass is left
/// as-is; this filter neither re-sorts nor filters by it.
#[must_use]
pub fn within<T>(rect: &GeoRect, candidates: &[T]) -> Vec<T>
where
    T: Positioned + Clone,
{
    candidates
        .iter()
        .filter(|c| rect.contains(c.position()))
        .cloned()
        .collect()
}
