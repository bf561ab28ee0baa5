//! Shared numeric constants for the discovery crate.

use std::time::Duration;

// ── Geodesy ─────────────────────────────────────────────────────

/// Mean Earth radius in kilometers used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Valid latitude range in degrees.
pub const MAX_LATITUDE: f64 = 90.0;

/// Valid longitude range in degrees.
pub const MAX_LONGITUDE: f64 = 180.0;

// ── Search defaults ─────────────────────────────────────────────

/// Result cap applied when the settings provider is unreachable.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Radius applied when the settings provider is unreachable. Zero is unlimited.
pub const DEFAULT_SEARCH_RADIUS_KM: f64 = 0.0;

// ── Origin acquisition ──────────────────────────────────────────

/// Hard limit on a single origin acquisition before falling back.
pub const ORIGIN_TIMEOUT: Duration = Duration::from_secs(10);

// ── Access ──────────────────────────────────────────────────────

/// Permission-table resource name for location records.
pub const LOCATIONS_RESOURCE: &str = "locations";
