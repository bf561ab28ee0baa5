//! Pure projection from the current result list to renderable markers.
//!
//! The map layer rebuilds its markers from this output every time the
//! controller reports `ResultsChanged`; no marker keeps a handle back into
//! engine state.

#[cfg(test)]
#[path = "markers_test.rs"]
mod markers_test;

use serde::Serialize;

use crate::access::{AccessReason, RecordAccess};
use crate::geo::GeoPoint;
use crate::record::{LocationRecord, LocationWithDistance, Positioned, RecordId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub id: RecordId,
    pub position: GeoPoint,
    pub code: String,
    pub city: String,
    pub distance_label: Option<String>,
    pub is_locked: bool,
    pub can_view: bool,
    pub view_reason: AccessReason,
    pub can_edit: bool,
    pub can_delete: bool,
    /// Editable despite the lock; hosts show a warning badge.
    pub overrides_lock: bool,
}

/// Build one marker per item, in list order.
pub fn project<F>(items: &[LocationWithDistance], decide: F) -> Vec<Marker>
where
    F: Fn(&LocationRecord) -> RecordAccess,
{
    items
        .iter()
        .map(|item| {
            let access = decide(&item.record);
            Marker {
                id: item.record.id,
                position: item.position(),
                code: item.record.code.clone(),
                city: item.record.city.clone(),
                distance_label: item.distance_km.map(format_distance),
                is_locked: item.record.is_locked,
                can_view: access.view.allowed,
                view_reason: access.view.reason,
                can_edit: access.edit.allowed,
                can_delete: access.delete.allowed,
                overrides_lock: access.edit.overrides_lock,
            }
        })
        .collect()
}

/// Human-readable distance: whole meters while they round below one kilometer,
/// otherwise one decimal of km.
#[must_use]
pub fn format_distance(km: f64) -> String {
    let meters = (km * 1000.0).round();
    if meters < 1000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{km:.1} km")
    }
}
