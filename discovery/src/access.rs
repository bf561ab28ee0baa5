//! Role-scoped permission tables and the per-record access resolver.
//!
//! DESIGN
//! ======
//! A role grants each `(resource, action)` pair one [`Scope`]. The resolver
//! turns that scope plus the record's owner and lock flag into an
//! [`AccessDecision`]. Denial is a value, never an error, and evaluation
//! touches nothing but shared references.
//!
//! The lock flag never turns an allow into a deny. It only picks the denial
//! reason shown to users without permission, and lets the UI flag an allow
//! on a locked record as a lock override. Toggling the lock itself is a
//! separate check on role alone ([`can_toggle_lock`]).
//!
//! TEAM scope defers to a [`TeamMembership`] predicate. [`TeamRoster`]
//! treats the owner as a team member when the owner is the acting user or
//! appears in the actor's preloaded reporting chain.

#[cfg(test)]
#[path = "access_test.rs"]
mod access_test;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::record::{LocationRecord, UserId};

// =============================================================================
// ROLES, ACTIONS, SCOPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    Delegate,
    Viewer,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Delegate => "delegate",
            Self::Viewer => "viewer",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "admin" => Some(Self::Admin),
            "supervisor" => Some(Self::Supervisor),
            "delegate" => Some(Self::Delegate),
            "viewer" => Some(Self::Viewer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    View,
    Edit,
    Delete,
    Create,
}

impl Action {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Edit => "edit",
            Self::Delete => "delete",
            Self::Create => "create",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "view" => Some(Self::View),
            "edit" => Some(Self::Edit),
            "delete" => Some(Self::Delete),
            "create" => Some(Self::Create),
            _ => None,
        }
    }
}

/// Breadth of records a permission covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    None,
    Own,
    Team,
    All,
}

impl Scope {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Own => "own",
            Self::Team => "team",
            Self::All => "all",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "none" => Some(Self::None),
            "own" => Some(Self::Own),
            "team" => Some(Self::Team),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// The acting user as the resolver sees them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub role: Role,
    #[serde(default)]
    pub supervisor_id: Option<UserId>,
}

// =============================================================================
// PERMISSION TABLE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    pub resource: String,
    pub action: Action,
    pub scope: Scope,
}

impl PermissionEntry {
    #[must_use]
    pub fn new(resource: impl Into<String>, action: Action, scope: Scope) -> Self {
        Self { resource: resource.into(), action, scope }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PermissionTableError {
    #[error("duplicate permission entry for {resource}:{action}")]
    DuplicateEntry { resource: String, action: &'static str },
}

/// A role's scopes, at most one per `(resource, action)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    scopes: HashMap<(String, Action), Scope>,
}

impl PermissionTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, rejecting a repeated `(resource, action)` pair.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntry` for the first pair that appears twice.
    pub fn from_entries<I>(entries: I) -> Result<Self, PermissionTableError>
    where
        I: IntoIterator<Item = PermissionEntry>,
    {
        let mut scopes = HashMap::new();
        for entry in entries {
            let key = (entry.resource, entry.action);
            if scopes.contains_key(&key) {
                let (resource, action) = key;
                return Err(PermissionTableError::DuplicateEntry { resource, action: action.as_str() });
            }
            scopes.insert(key, entry.scope);
        }
        Ok(Self { scopes })
    }

    /// Scope granted for `(resource, action)`. Absent pairs are `None`.
    #[must_use]
    pub fn scope(&self, resource: &str, action: Action) -> Scope {
        self.scopes
            .get(&(resource.to_owned(), action))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

// =============================================================================
// TEAM MEMBERSHIP
// =============================================================================

/// Decides whether a record owner falls inside the acting user's team.
pub trait TeamMembership {
    fn is_member(&self, actor: UserId, owner: UserId) -> bool;
}

/// Preloaded set of users reporting (directly or transitively) to one actor.
#[derive(Debug, Clone, Default)]
pub struct TeamRoster {
    actor: UserId,
    members: HashSet<UserId>,
}

impl TeamRoster {
    #[must_use]
    pub fn new(actor: UserId, members: impl IntoIterator<Item = UserId>) -> Self {
        Self { actor, members: members.into_iter().collect() }
    }
}

impl TeamMembership for TeamRoster {
    fn is_member(&self, actor: UserId, owner: UserId) -> bool {
        actor == owner || (actor == self.actor && self.members.contains(&owner))
    }
}

/// Membership predicate that only recognizes the actor themself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTeam;

impl TeamMembership for NoTeam {
    fn is_member(&self, actor: UserId, owner: UserId) -> bool {
        actor == owner
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// The ownership and lock state the resolver needs from a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessTarget {
    pub owner_id: Option<UserId>,
    pub is_locked: bool,
}

impl AccessTarget {
    /// A record about to be created by `user`.
    #[must_use]
    pub fn new_record(user: &User) -> Self {
        Self { owner_id: Some(user.id), is_locked: false }
    }
}

impl From<&LocationRecord> for AccessTarget {
    fn from(record: &LocationRecord) -> Self {
        Self { owner_id: record.owner_id, is_locked: record.is_locked }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessReason {
    Allowed,
    NoPermission,
    LockedNoPerm,
}

impl AccessReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allowed => "ALLOWED",
            Self::NoPermission => "NO_PERMISSION",
            Self::LockedNoPerm => "LOCKED_NO_PERM",
        }
    }

    /// User-facing explanation for the decision.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Allowed => "Allowed",
            Self::NoPermission => "You do not have permission to perform this action",
            Self::LockedNoPerm => "This location is locked and you do not have permission to change it",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
    /// `true` when access is allowed on a locked record.
    pub overrides_lock: bool,
}

impl AccessDecision {
    fn allow(target: AccessTarget) -> Self {
        Self { allowed: true, reason: AccessReason::Allowed, overrides_lock: target.is_locked }
    }

    fn deny(target: AccessTarget) -> Self {
        let reason = if target.is_locked { AccessReason::LockedNoPerm } else { AccessReason::NoPermission };
        Self { allowed: false, reason, overrides_lock: false }
    }
}

/// Resolve whether `user` may perform `action` on `resource` for `target`.
#[must_use]
pub fn evaluate(
    user: &User,
    resource: &str,
    action: Action,
    target: AccessTarget,
    table: &PermissionTable,
    team: &dyn TeamMembership,
) -> AccessDecision {
    let allowed = match table.scope(resource, action) {
        Scope::None => false,
        Scope::Own => target.owner_id == Some(user.id),
        Scope::Team => target.owner_id.is_some_and(|owner| team.is_member(user.id, owner)),
        Scope::All => true,
    };

    if allowed { AccessDecision::allow(target) } else { AccessDecision::deny(target) }
}

/// Whether `user` may lock or unlock records. Independent of edit scope.
#[must_use]
pub fn can_toggle_lock(user: &User) -> bool {
    matches!(user.role, Role::Admin | Role::Supervisor)
}

/// Everything the UI needs to render one record's affordances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordAccess {
    pub view: AccessDecision,
    pub edit: AccessDecision,
    pub delete: AccessDecision,
    pub can_toggle_lock: bool,
}

/// Evaluate view, edit, and delete for one record in one pass.
#[must_use]
pub fn record_access(
    user: &User,
    resource: &str,
    record: &LocationRecord,
    table: &PermissionTable,
    team: &dyn TeamMembership,
) -> RecordAccess {
    let target = AccessTarget::from(record);
    RecordAccess {
        view: evaluate(user, resource, Action::View, target, table, team),
        edit: evaluate(user, resource, Action::Edit, target, table, team),
        delete: evaluate(user, resource, Action::Delete, target, table, team),
        can_toggle_lock: can_toggle_lock(user),
    }
}
