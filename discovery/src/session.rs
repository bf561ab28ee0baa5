//! Async discovery session: collaborators in, host actions out.
//!
//! DESIGN
//! ======
//! A session belongs to one acting user and one map view. It loads the
//! user's permission table and the search settings when opened, then drives
//! the [`ModeController`] through the load sequence:
//!
//! 1. acquire the origin (bounded by [`ORIGIN_TIMEOUT`]),
//! 2. fetch the general pool and, with an origin, a nearby priority list,
//! 3. merge by identity, drop records the user may not view, and resolve
//!    NEAREST.
//!
//! ERROR HANDLING
//! ==============
//! Origin failures are never errors; they select the fallback ordering.
//! A failed settings read falls back to defaults and a failed nearby read
//! falls back to the general pool alone. Store failures on the general pool
//! or on a write propagate as [`SessionError::Store`], and the cached list
//! is only changed after the store confirms the write.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::access::{self, AccessReason, AccessTarget, PermissionTable, RecordAccess, TeamMembership, User};
use crate::area::GeoRect;
use crate::consts::{LOCATIONS_RESOURCE, ORIGIN_TIMEOUT};
use crate::geo::GeoPoint;
use crate::markers::{self, Marker};
use crate::merge::merge_by_identity;
use crate::mode::{Action, ModeController};
use crate::provider::{
    OriginProvider, PermissionProvider, RecordStore, SettingsProvider, StoreError, acquire_origin, load_settings,
};
use crate::record::{LocationRecord, LocationWithDistance, RecordId, ValidationError};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid location: {0}")]
    Validation(#[from] ValidationError),
    #[error("{}", .0.message())]
    Forbidden(AccessReason),
    #[error("only admins and supervisors can lock or unlock locations")]
    LockNotPermitted,
    #[error("location not found: {0}")]
    NotFound(i64),
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Everything a session reaches outside the engine.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn RecordStore>,
    pub settings: Arc<dyn SettingsProvider>,
    pub permissions: Arc<dyn PermissionProvider>,
    pub origin: Arc<dyn OriginProvider>,
    pub team: Arc<dyn TeamMembership + Send + Sync>,
}

// =============================================================================
// SESSION
// =============================================================================

pub struct DiscoverySession {
    deps: Collaborators,
    user: User,
    editor: String,
    table: PermissionTable,
    controller: ModeController,
    origin_timeout: Duration,
}

impl DiscoverySession {
    /// Open a session for `user`, loading their permission table and the search settings.
    ///
    /// `editor` is the display name stamped on records this session saves.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the permission table cannot be loaded.
    pub async fn open(deps: Collaborators, user: User, editor: impl Into<String>) -> Result<Self, SessionError> {
        let table = deps.permissions.role_permissions(user.role).await?;
        let settings = load_settings(deps.settings.as_ref()).await;
        info!(
            user_id = user.id,
            role = user.role.as_str(),
            max_results = settings.max_results,
            "discovery session opened"
        );
        Ok(Self {
            deps,
            user,
            editor: editor.into(),
            table,
            controller: ModeController::new(settings),
            origin_timeout: ORIGIN_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_origin_timeout(mut self, limit: Duration) -> Self {
        self.origin_timeout = limit;
        self
    }

    #[must_use]
    pub fn controller(&self) -> &ModeController {
        &self.controller
    }

    #[must_use]
    pub fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub fn results(&self) -> &[LocationWithDistance] {
        self.controller.results()
    }

    /// Run the full load sequence and resolve NEAREST.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the general pool cannot be read.
    pub async fn load(&mut self) -> Result<Vec<Action>, SessionError> {
        let mut actions = self.controller.start();
        let outcome = acquire_origin(self.deps.origin.as_ref(), self.origin_timeout).await;
        let settings = self.controller.settings();

        let (general, priority) = match outcome {
            Ok(origin) => {
                let (general, nearby) = tokio::join!(
                    self.deps.store.get_all(),
                    self.deps
                        .store
                        .get_nearby(origin, settings.search_radius_km, settings.max_results)
                );
                let priority = match nearby {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(error = %e, "nearby fetch failed, using general pool only");
                        Vec::new()
                    }
                };
                (general?, priority)
            }
            Err(_) => (self.deps.store.get_all().await?, Vec::new()),
        };

        let merged = merge_by_identity(general, priority);
        let total = merged.len();
        let visible: Vec<LocationWithDistance> = merged
            .into_iter()
            .filter(|record| self.can_view(record))
            .map(LocationWithDistance::from)
            .collect();
        info!(
            candidates = visible.len(),
            hidden = total - visible.len(),
            origin = outcome.is_ok(),
            mode = self.controller.mode().name(),
            "discovery pool loaded"
        );

        actions.extend(self.controller.set_candidates(visible));
        actions.extend(self.controller.resolve_origin(outcome));
        Ok(actions)
    }

    /// Prime the cached pool with records fetched elsewhere, without searching.
    ///
    /// Writes look records up in the cache, so a host that skips [`Self::load`]
    /// seeds the records it is about to change.
    pub fn seed(&mut self, records: Vec<LocationRecord>) -> Vec<Action> {
        self.controller.set_candidates(records.into_iter().map(LocationWithDistance::from).collect())
    }

    /// Return to NEAREST, reacquiring the origin only if none is cached.
    pub async fn reset(&mut self) -> Vec<Action> {
        let mut actions = self.controller.reset();
        if actions.contains(&Action::AcquireOrigin) {
            let outcome = acquire_origin(self.deps.origin.as_ref(), self.origin_timeout).await;
            actions.extend(self.controller.resolve_origin(outcome));
        }
        actions
    }

    // --- Drawing ---

    pub fn set_drawing_enabled(&mut self, enabled: bool) -> Vec<Action> {
        self.controller.set_drawing_enabled(enabled)
    }

    pub fn on_pointer_down(&mut self, point: GeoPoint) -> Vec<Action> {
        self.controller.on_pointer_down(point)
    }

    pub fn on_pointer_move(&mut self, point: GeoPoint) -> Vec<Action> {
        self.controller.on_pointer_move(point)
    }

    pub fn on_pointer_up(&mut self, point: GeoPoint) -> Vec<Action> {
        self.controller.on_pointer_up(point)
    }

    pub fn select_area(&mut self, rect: GeoRect) -> Vec<Action> {
        self.controller.select_area(rect)
    }

    // --- Access ---

    /// View, edit, and delete decisions for one record.
    #[must_use]
    pub fn access_for(&self, record: &LocationRecord) -> RecordAccess {
        access::record_access(&self.user, LOCATIONS_RESOURCE, record, &self.table, self.deps.team.as_ref())
    }

    /// Whether the acting user may see `record` at all.
    #[must_use]
    pub fn can_view(&self, record: &LocationRecord) -> bool {
        let target = AccessTarget::from(record);
        let team = self.deps.team.as_ref();
        access::evaluate(&self.user, LOCATIONS_RESOURCE, access::Action::View, target, &self.table, team).allowed
    }

    /// Markers for the current result list.
    #[must_use]
    pub fn markers(&self) -> Vec<Marker> {
        markers::project(self.controller.results(), |record| self.access_for(record))
    }

    // --- Writes ---

    /// Create or update a record.
    ///
    /// New records are owned by the acting user. Updates keep the cached
    /// owner and lock state; the lock only changes through [`Self::toggle_lock`].
    ///
    /// # Errors
    ///
    /// Validation, permission, and store failures; the cache is untouched on error.
    pub async fn save(&mut self, mut record: LocationRecord) -> Result<(LocationRecord, Vec<Action>), SessionError> {
        record.validate()?;

        let (action, target) = match record.id {
            RecordId::Pending => {
                record.owner_id = Some(self.user.id);
                record.is_locked = false;
                (access::Action::Create, AccessTarget::new_record(&self.user))
            }
            RecordId::Assigned(id) => {
                let existing = self.controller.find(id).ok_or(SessionError::NotFound(id))?;
                record.owner_id = existing.owner_id;
                record.owner_name.clone_from(&existing.owner_name);
                record.is_locked = existing.is_locked;
                (access::Action::Edit, AccessTarget::from(existing))
            }
        };
        self.authorize(action, target)?;

        let saved = self.deps.store.save(record, &self.editor).await?;
        info!(id = ?saved.id.assigned(), code = %saved.code, "location saved");
        let actions = self.controller.upsert_record(saved.clone());
        Ok((saved, actions))
    }

    /// # Errors
    ///
    /// `NotFound` for an unknown record, `Forbidden` without delete scope, or a store failure.
    pub async fn delete(&mut self, id: i64) -> Result<Vec<Action>, SessionError> {
        let existing = self.controller.find(id).ok_or(SessionError::NotFound(id))?;
        self.authorize(access::Action::Delete, AccessTarget::from(existing))?;

        self.deps.store.delete(id).await?;
        info!(id, "location deleted");
        Ok(self.controller.remove_record(id))
    }

    /// Flip a record's lock. Admins and supervisors only.
    ///
    /// # Errors
    ///
    /// `LockNotPermitted` for other roles, `NotFound` for an unknown record, or a store failure.
    pub async fn toggle_lock(&mut self, id: i64) -> Result<(LocationRecord, Vec<Action>), SessionError> {
        if !access::can_toggle_lock(&self.user) {
            return Err(SessionError::LockNotPermitted);
        }
        let mut record = self.controller.find(id).ok_or(SessionError::NotFound(id))?.clone();
        record.is_locked = !record.is_locked;

        let saved = self.deps.store.save(record, &self.editor).await?;
        info!(id, locked = saved.is_locked, "location lock toggled");
        let actions = self.controller.upsert_record(saved.clone());
        Ok((saved, actions))
    }

    fn authorize(&self, action: access::Action, target: AccessTarget) -> Result<(), SessionError> {
        let decision = access::evaluate(
            &self.user,
            LOCATIONS_RESOURCE,
            action,
            target,
            &self.table,
            self.deps.team.as_ref(),
        );
        if decision.allowed {
            Ok(())
        } else {
            warn!(
                user_id = self.user.id,
                action = action.as_str(),
                reason = decision.reason.as_str(),
                "write denied"
            );
            Err(SessionError::Forbidden(decision.reason))
        }
    }
}
