//! Collaborator contracts consumed by the discovery session.
//!
//! ARCHITECTURE
//! ============
//! Storage, settings, permission tables, and geolocation live outside this
//! crate. Each is an `async_trait` seam so the service can back them with
//! Postgres and tests can back them with in-memory fakes.

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;

use std::time::Duration;

use tracing::warn;

use crate::access::{PermissionTable, PermissionTableError, Role};
use crate::geo::GeoPoint;
use crate::proximity::{OriginError, OriginOutcome};
use crate::record::{LocationRecord, SearchSettings, ValidationError};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("location not found: {0}")]
    NotFound(i64),
    #[error("location code already exists: {0}")]
    DuplicateCode(String),
    #[error("location code is immutable: {current} cannot become {requested}")]
    ImmutableCode { current: String, requested: String },
    #[error("invalid location: {0}")]
    Invalid(#[from] ValidationError),
    #[error("invalid permission table: {0}")]
    Permissions(#[from] PermissionTableError),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

// =============================================================================
// TRAITS
// =============================================================================

/// CRUD access to location records.
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Every record the caller may browse.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    async fn get_all(&self) -> Result<Vec<LocationRecord>, StoreError>;

    /// Records near `origin`, nearest first. A zero radius is unlimited.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the store cannot be read.
    async fn get_nearby(&self, origin: GeoPoint, radius_km: f64, limit: usize)
    -> Result<Vec<LocationRecord>, StoreError>;

    /// Create (pending identity) or fully replace a record, stamping audit fields.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the record is rejected or the write fails.
    async fn save(&self, record: LocationRecord, editor: &str) -> Result<LocationRecord, StoreError>;

    /// # Errors
    ///
    /// Returns `NotFound` if no record has this identity.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
pub trait SettingsProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`StoreError`] if settings cannot be loaded.
    async fn search_settings(&self) -> Result<SearchSettings, StoreError>;
}

#[async_trait::async_trait]
pub trait PermissionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the table cannot be loaded or is malformed.
    async fn role_permissions(&self, role: Role) -> Result<PermissionTable, StoreError>;
}

/// One-shot source of the user's current position.
#[async_trait::async_trait]
pub trait OriginProvider: Send + Sync {
    async fn acquire(&self) -> OriginOutcome;
}

// =============================================================================
// HELPERS
// =============================================================================

/// Acquire an origin, resolving to `Timeout` if `limit` elapses first.
pub async fn acquire_origin(provider: &dyn OriginProvider, limit: Duration) -> OriginOutcome {
    match tokio::time::timeout(limit, provider.acquire()).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(limit_ms = limit.as_millis(), "origin acquisition timed out");
            Err(OriginError::Timeout)
        }
    }
}

/// Load settings, falling back to defaults when the provider fails.
pub async fn load_settings(provider: &dyn SettingsProvider) -> SearchSettings {
    match provider.search_settings().await {
        Ok(settings) => settings.sanitized(),
        Err(e) => {
            warn!(error = %e, "search settings unavailable, using defaults");
            SearchSettings::default()
        }
    }
}

/// An origin already known to the caller, e.g. reported by a client request.
#[derive(Debug, Clone, Copy)]
pub struct FixedOrigin(pub OriginOutcome);

#[async_trait::async_trait]
impl OriginProvider for FixedOrigin {
    async fn acquire(&self) -> OriginOutcome {
        self.0
    }
}

/// Settings supplied up front instead of fetched.
#[derive(Debug, Clone, Copy)]
pub struct FixedSettings(pub SearchSettings);

#[async_trait::async_trait]
impl SettingsProvider for FixedSettings {
    async fn search_settings(&self) -> Result<SearchSettings, StoreError> {
        Ok(self.0)
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::sync::{Mutex, PoisonError};
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

    use time::OffsetDateTime;

    use super::*;
    use crate::record::RecordId;

    /// In-memory [`RecordStore`] with switchable failures.
    #[derive(Default)]
    pub struct MemoryStore {
        pub records: Mutex<Vec<LocationRecord>>,
        pub next_id: AtomicI64,
        pub fail_all: AtomicBool,
        pub fail_nearby: AtomicBool,
        pub fail_writes: AtomicBool,
    }

    impl MemoryStore {
        pub fn with_records(records: Vec<LocationRecord>) -> Self {
            let next = records.iter().filter_map(|r| r.id.assigned()).max().unwrap_or(0) + 1;
            Self { records: Mutex::new(records), next_id: AtomicI64::new(next), ..Self::default() }
        }
    }

    #[async_trait::async_trait]
    impl RecordStore for MemoryStore {
        async fn get_all(&self) -> Result<Vec<LocationRecord>, StoreError> {
            if self.fail_all.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("get_all failed".into()));
            }
            Ok(self.records.lock().unwrap_or_else(PoisonError::into_inner).clone())
        }

        async fn get_nearby(
            &self,
            origin: GeoPoint,
            radius_km: f64,
            limit: usize,
        ) -> Result<Vec<LocationRecord>, StoreError> {
            if self.fail_nearby.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("get_nearby failed".into()));
            }
            let records = self.records.lock().unwrap_or_else(PoisonError::into_inner).clone();
            let settings = SearchSettings::new(limit, radius_km);
            Ok(crate::proximity::nearest(Some(origin), records, &settings)
                .items
                .into_iter()
                .map(|item| item.record)
                .collect())
        }

        async fn save(&self, mut record: LocationRecord, editor: &str) -> Result<LocationRecord, StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("save failed".into()));
            }
            record.validate()?;
            record.last_edited_by = editor.to_owned();
            record.last_edited_at = Some(OffsetDateTime::now_utc());

            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            match record.id {
                RecordId::Pending => {
                    if records.iter().any(|r| r.code == record.code) {
                        return Err(StoreError::DuplicateCode(record.code));
                    }
                    record.id = RecordId::Assigned(self.next_id.fetch_add(1, Ordering::SeqCst));
                    records.push(record.clone());
                }
                RecordId::Assigned(id) => {
                    let existing = records
                        .iter_mut()
                        .find(|r| r.id == record.id)
                        .ok_or(StoreError::NotFound(id))?;
                    if existing.code != record.code {
                        return Err(StoreError::ImmutableCode {
                            current: existing.code.clone(),
                            requested: record.code,
                        });
                    }
                    *existing = record.clone();
                }
            }
            Ok(record)
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Unavailable("delete failed".into()));
            }
            let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            let before = records.len();
            records.retain(|r| r.id != RecordId::Assigned(id));
            if records.len() == before {
                return Err(StoreError::NotFound(id));
            }
            Ok(())
        }
    }

    /// Settings provider that always fails.
    pub struct BrokenSettings;

    #[async_trait::async_trait]
    impl SettingsProvider for BrokenSettings {
        async fn search_settings(&self) -> Result<SearchSettings, StoreError> {
            Err(StoreError::Unavailable("settings offline".into()))
        }
    }

    /// Origin provider that never answers.
    pub struct HangingOrigin;

    #[async_trait::async_trait]
    impl OriginProvider for HangingOrigin {
        async fn acquire(&self) -> OriginOutcome {
            std::future::pending::<OriginOutcome>().await
        }
    }
}
