//! Location records and the search settings applied to them.
//!
//! DESIGN
//! ======
//! A record's identity is either assigned by the store or the `Pending`
//! sentinel used for records that have not been saved yet. Pending records
//! never compare equal by identity, so a merge keeps every one of them.

#[cfg(test)]
#[path = "record_test.rs"]
mod record_test;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::consts::{DEFAULT_MAX_RESULTS, DEFAULT_SEARCH_RADIUS_KM};
use crate::geo::GeoPoint;

/// Identity of a user as issued by the user directory.
pub type UserId = i64;

// =============================================================================
// IDENTITY
// =============================================================================

/// Identity of a location record.
///
/// Serialized as a nullable integer: `null` means the record is pending creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<i64>", into = "Option<i64>")]
pub enum RecordId {
    /// Not yet saved; the store assigns an identity on first save.
    #[default]
    Pending,
    /// Identity assigned by the store.
    Assigned(i64),
}

impl RecordId {
    #[must_use]
    pub fn assigned(self) -> Option<i64> {
        match self {
            Self::Pending => None,
            Self::Assigned(id) => Some(id),
        }
    }

    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<Option<i64>> for RecordId {
    fn from(value: Option<i64>) -> Self {
        value.map_or(Self::Pending, Self::Assigned)
    }
}

impl From<RecordId> for Option<i64> {
    fn from(value: RecordId) -> Self {
        value.assigned()
    }
}

/// Anything that carries a record identity. Drives [`crate::merge`].
pub trait Identified {
    fn identity(&self) -> RecordId;
}

/// Anything with a map position. Drives [`crate::area`] and [`crate::proximity`].
pub trait Positioned {
    fn position(&self) -> GeoPoint;
}

// =============================================================================
// LOCATION RECORD
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("location code is required")]
    MissingCode,
    #[error("city name is required")]
    MissingCity,
    #[error("latitude out of range: {0}")]
    LatitudeOutOfRange(String),
    #[error("longitude out of range: {0}")]
    LongitudeOutOfRange(String),
}

/// A geo-tagged point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    #[serde(default)]
    pub id: RecordId,
    /// External code. Unique across records and fixed once created.
    pub code: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub owner_id: Option<UserId>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub last_edited_by: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_edited_at: Option<OffsetDateTime>,
}

impl LocationRecord {
    /// A new unsaved record with only the required fields set.
    #[must_use]
    pub fn new(code: impl Into<String>, city: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: RecordId::Pending,
            code: code.into(),
            city: city.into(),
            latitude,
            longitude,
            image: None,
            notes: None,
            owner_id: None,
            owner_name: None,
            is_locked: false,
            last_edited_by: String::new(),
            last_edited_at: None,
        }
    }

    /// Check required fields and coordinate ranges.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::MissingCode);
        }
        if self.city.trim().is_empty() {
            return Err(ValidationError::MissingCity);
        }
        let point = self.position();
        if !(point.lat.is_finite() && (-90.0..=90.0).contains(&point.lat)) {
            return Err(ValidationError::LatitudeOutOfRange(self.latitude.to_string()));
        }
        if !(point.lon.is_finite() && (-180.0..=180.0).contains(&point.lon)) {
            return Err(ValidationError::LongitudeOutOfRange(self.longitude.to_string()));
        }
        Ok(())
    }
}

impl Identified for LocationRecord {
    fn identity(&self) -> RecordId {
        self.id
    }
}

impl Positioned for LocationRecord {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

// =============================================================================
// LOCATION WITH DISTANCE
// =============================================================================

/// A record plus its distance from the search origin, when one was known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithDistance {
    #[serde(flatten)]
    pub record: LocationRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl LocationWithDistance {
    #[must_use]
    pub fn new(record: LocationRecord, distance_km: Option<f64>) -> Self {
        Self { record, distance_km }
    }
}

impl From<LocationRecord> for LocationWithDistance {
    fn from(record: LocationRecord) -> Self {
        Self { record, distance_km: None }
    }
}

impl Identified for LocationWithDistance {
    fn identity(&self) -> RecordId {
        self.record.id
    }
}

impl Positioned for LocationWithDistance {
    fn position(&self) -> GeoPoint {
        self.record.position()
    }
}

// =============================================================================
// SEARCH SETTINGS
// =============================================================================

/// Result cap and radius applied by the proximity engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    pub max_results: usize,
    /// Kilometers. Zero means unlimited.
    pub search_radius_km: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { max_results: DEFAULT_MAX_RESULTS, search_radius_km: DEFAULT_SEARCH_RADIUS_KM }
    }
}

impl SearchSettings {
    #[must_use]
    pub fn new(max_results: usize, search_radius_km: f64) -> Self {
        Self { max_results, search_radius_km }.sanitized()
    }

    /// Force `max_results >= 1` and a finite, non-negative radius.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let radius = if self.search_radius_km.is_finite() && self.search_radius_km > 0.0 {
            self.search_radius_km
        } else {
            0.0
        };
        Self { max_results: self.max_results.max(1), search_radius_km: radius }
    }

    /// Whether a radius cutoff applies.
    #[must_use]
    pub fn has_radius(&self) -> bool {
        self.search_radius_km > 0.0
    }
}
