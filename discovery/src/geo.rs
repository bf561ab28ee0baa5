//! Geographic points and great-circle distance.
//!
//! Coordinates outside the valid range are clamped before any math runs:
//! latitude to `[-90, 90]` and longitude to `[-180, 180]`. A NaN coordinate
//! is treated as `0.0`. This keeps [`distance_km`] total so the search
//! engines never have to handle a failure from it.

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;

use serde::{Deserialize, Serialize};

use crate::consts::{EARTH_RADIUS_KM, MAX_LATITUDE, MAX_LONGITUDE};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Whether both coordinates are finite and within the valid ranges.
    #[must_use]
    pub fn is_valid(self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-MAX_LATITUDE..=MAX_LATITUDE).contains(&self.lat)
            && (-MAX_LONGITUDE..=MAX_LONGITUDE).contains(&self.lon)
    }

    /// Copy of this point with both coordinates forced into range.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self { lat: clamp_coord(self.lat, MAX_LATITUDE), lon: clamp_coord(self.lon, MAX_LONGITUDE) }
    }

    /// Great-circle distance to `other` in kilometers.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}

fn clamp_coord(value: f64, limit: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-limit, limit) }
}

/// Haversine distance in kilometers between two points given in degrees.
///
/// Symmetric, never negative, and zero when the points coincide.
#[must_use]
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1 = clamp_coord(lat1, MAX_LATITUDE).to_radians();
    let lat2 = clamp_coord(lat2, MAX_LATITUDE).to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (clamp_coord(lon2, MAX_LONGITUDE) - clamp_coord(lon1, MAX_LONGITUDE)).to_radians();

    let half_lat = (d_lat / 2.0).sin();
    let half_lon = (d_lon / 2.0).sin();
    // Rounding can push `a` a hair past 1 for antipodal points.
    let a = (half_lat * half_lat + lat1.cos() * lat2.cos() * half_lon * half_lon).clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}
