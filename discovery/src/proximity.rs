//! Nearest-N search with an optional radius cutoff.
//!
//! DESIGN
//! ======
//! With a known origin every candidate gets a distance, candidates beyond a
//! positive radius are dropped, the rest are stably sorted nearest first and
//! truncated to `max_results`. Without an origin the engine degrades to the
//! first `max_results` pool entries in pool order, with no distances. Neither
//! path can fail.

#[cfg(test)]
#[path = "proximity_test.rs"]
mod proximity_test;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::record::{LocationWithDistance, Positioned, SearchSettings};

/// Why the search origin could not be acquired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum OriginError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    PositionUnavailable,
    #[error("location request timed out")]
    Timeout,
}

impl OriginError {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::PositionUnavailable => "position_unavailable",
            Self::Timeout => "timeout",
        }
    }

    /// Parse the wire name used by hosts reporting a failed acquisition.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "permission_denied" => Some(Self::PermissionDenied),
            "position_unavailable" => Some(Self::PositionUnavailable),
            "timeout" => Some(Self::Timeout),
            _ => None,
        }
    }
}

/// Outcome of a single origin acquisition.
pub type OriginOutcome = Result<GeoPoint, OriginError>;

/// Ranked, bounded output of [`nearest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProximityResult {
    pub items: Vec<LocationWithDistance>,
    /// `false` on the no-origin fallback; items then carry no distance.
    pub distances_valid: bool,
}

/// Rank `candidates` around `origin` according to `settings`.
#[must_use]
pub fn nearest<I, T>(origin: Option<GeoPoint>, candidates: I, settings: &SearchSettings) -> ProximityResult
where
    I: IntoIterator<Item = T>,
    T: Into<LocationWithDistance>,
{
    let settings = settings.sanitized();
    let candidates = candidates.into_iter().map(Into::<LocationWithDistance>::into);

    let Some(origin) = origin else {
        let items = candidates
            .take(settings.max_results)
            .map(|item| LocationWithDistance::new(item.record, None))
            .collect();
        return ProximityResult { items, distances_valid: false };
    };

    let mut ranked: Vec<(f64, LocationWithDistance)> = candidates
        .map(|item| (origin.distance_to(item.position()), item))
        .filter(|(distance, _)| !settings.has_radius() || *distance <= settings.search_radius_km)
        .collect();

    // `sort_by` is stable: equal distances keep their pool order.
    ranked.sort_by(|(a, _), (b, _)| a.total_cmp(b));
    ranked.truncate(settings.max_results);

    let items = ranked
        .into_iter()
        .map(|(distance, item)| LocationWithDistance::new(item.record, Some(distance)))
        .collect();
    ProximityResult { items, distances_valid: true }
}
