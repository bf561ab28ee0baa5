use super::*;

const RESOURCE: &str = "odb";

fn user(id: UserId, role: Role) -> User {
    User { id, role, supervisor_id: None }
}

fn table(scope: Scope) -> PermissionTable {
    PermissionTable::from_entries([
        PermissionEntry::new(RESOURCE, Action::View, Scope::All),
        PermissionEntry::new(RESOURCE, Action::Edit, scope),
        PermissionEntry::new(RESOURCE, Action::Delete, scope),
    ])
    .unwrap()
}

fn target(owner: Option<UserId>, locked: bool) -> AccessTarget {
    AccessTarget { owner_id: owner, is_locked: locked }
}

// =============================================================
// Enum wire names
// =============================================================

#[test]
fn role_roundtrip_str() {
    for role in [Role::Admin, Role::Supervisor, Role::Delegate, Role::Viewer] {
        assert_eq!(Role::parse(role.as_str()), Some(role));
    }
    assert_eq!(Role::parse("ADMIN"), None);
    assert_eq!(Role::parse(""), None);
}

#[test]
fn action_and_scope_roundtrip_str() {
    for action in [Action::View, Action::Edit, Action::Delete, Action::Create] {
        assert_eq!(Action::parse(action.as_str()), Some(action));
    }
    for scope in [Scope::None, Scope::Own, Scope::Team, Scope::All] {
        assert_eq!(Scope::parse(scope.as_str()), Some(scope));
    }
    assert_eq!(Scope::parse("everyone"), None);
}

#[test]
fn reason_serializes_screaming_snake() {
    let json = serde_json::to_string(&AccessReason::LockedNoPerm).unwrap();
    assert_eq!(json, "\"LOCKED_NO_PERM\"");
    assert_eq!(AccessReason::NoPermission.as_str(), "NO_PERMISSION");
}

// =============================================================
// PermissionTable
// =============================================================

#[test]
fn table_missing_pair_is_none() {
    let t = PermissionTable::new();
    assert!(t.is_empty());
    assert_eq!(t.scope(RESOURCE, Action::Edit), Scope::None);
}

#[test]
fn table_rejects_duplicate_pair() {
    let err = PermissionTable::from_entries([
        PermissionEntry::new(RESOURCE, Action::Edit, Scope::Own),
        PermissionEntry::new(RESOURCE, Action::Edit, Scope::All),
    ])
    .unwrap_err();
    assert_eq!(err, PermissionTableError::DuplicateEntry { resource: RESOURCE.into(), action: "edit" });
}

#[test]
fn table_scopes_are_per_resource() {
    let t = table(Scope::Own);
    assert_eq!(t.len(), 3);
    assert_eq!(t.scope(RESOURCE, Action::Edit), Scope::Own);
    assert_eq!(t.scope("other", Action::Edit), Scope::None);
}

// =============================================================
// evaluate - scopes
// =============================================================

#[test]
fn scope_none_denies_any_owner() {
    let u = user(42, Role::Delegate);
    let t = table(Scope::None);
    for owner in [Some(42), Some(7), None] {
        let d = evaluate(&u, RESOURCE, Action::Edit, target(owner, false), &t, &NoTeam);
        assert!(!d.allowed);
        assert_eq!(d.reason, AccessReason::NoPermission);
    }
}

#[test]
fn scope_all_allows_any_owner() {
    let u = user(42, Role::Delegate);
    let t = table(Scope::All);
    for owner in [Some(42), Some(7), None] {
        for locked in [false, true] {
            let d = evaluate(&u, RESOURCE, Action::Delete, target(owner, locked), &t, &NoTeam);
            assert!(d.allowed);
            assert_eq!(d.reason, AccessReason::Allowed);
        }
    }
}

#[test]
fn scope_own_allows_only_owner() {
    let u = user(42, Role::Delegate);
    let t = table(Scope::Own);
    assert!(evaluate(&u, RESOURCE, Action::Edit, target(Some(42), false), &t, &NoTeam).allowed);
    assert!(!evaluate(&u, RESOURCE, Action::Edit, target(Some(7), false), &t, &NoTeam).allowed);
    assert!(!evaluate(&u, RESOURCE, Action::Edit, target(None, false), &t, &NoTeam).allowed);
}

#[test]
fn delegate_edit_own_example() {
    let u = user(42, Role::Delegate);
    let t = PermissionTable::from_entries([PermissionEntry::new("odb", Action::Edit, Scope::Own)]).unwrap();

    let a = evaluate(&u, "odb", Action::Edit, target(Some(42), false), &t, &NoTeam);
    assert!(a.allowed);

    let b = evaluate(&u, "odb", Action::Edit, target(Some(7), false), &t, &NoTeam);
    assert!(!b.allowed);
    assert_eq!(b.reason, AccessReason::NoPermission);

    let b_locked = evaluate(&u, "odb", Action::Edit, target(Some(7), true), &t, &NoTeam);
    assert!(!b_locked.allowed);
    assert_eq!(b_locked.reason, AccessReason::LockedNoPerm);
}

#[test]
fn scope_team_uses_membership() {
    // 7 reports to 20, 20 reports to 42.
    let chain = TeamRoster::new(42, [20, 7]);
    let u = user(42, Role::Supervisor);
    let t = table(Scope::Team);
    assert!(evaluate(&u, RESOURCE, Action::Edit, target(Some(7), false), &t, &chain).allowed);
    assert!(evaluate(&u, RESOURCE, Action::Edit, target(Some(42), false), &t, &chain).allowed);
    assert!(!evaluate(&u, RESOURCE, Action::Edit, target(Some(99), false), &t, &chain).allowed);
    assert!(!evaluate(&u, RESOURCE, Action::Edit, target(None, false), &t, &chain).allowed);
}

#[test]
fn team_scope_does_not_cover_own_supervisor() {
    let chain = TeamRoster::new(7, std::iter::empty());
    let u = user(7, Role::Delegate);
    let d = evaluate(&u, RESOURCE, Action::Edit, target(Some(20), false), &table(Scope::Team), &chain);
    assert!(!d.allowed);
}

// =============================================================
// evaluate - lock interaction
// =============================================================

#[test]
fn lock_never_downgrades_allow() {
    let u = user(42, Role::Delegate);
    let d = evaluate(&u, RESOURCE, Action::Edit, target(Some(42), true), &table(Scope::Own), &NoTeam);
    assert!(d.allowed);
    assert_eq!(d.reason, AccessReason::Allowed);
    assert!(d.overrides_lock);
}

#[test]
fn unlocked_allow_is_not_an_override() {
    let u = user(42, Role::Delegate);
    let d = evaluate(&u, RESOURCE, Action::Edit, target(Some(42), false), &table(Scope::Own), &NoTeam);
    assert!(!d.overrides_lock);
}

#[test]
fn locked_denial_reason() {
    let u = user(42, Role::Viewer);
    let d = evaluate(&u, RESOURCE, Action::Edit, target(Some(7), true), &table(Scope::None), &NoTeam);
    assert_eq!(d.reason, AccessReason::LockedNoPerm);
    assert!(!d.overrides_lock);
}

#[test]
fn create_uses_prospective_owner() {
    let u = user(42, Role::Delegate);
    let t = PermissionTable::from_entries([PermissionEntry::new(RESOURCE, Action::Create, Scope::Own)]).unwrap();
    let d = evaluate(&u, RESOURCE, Action::Create, AccessTarget::new_record(&u), &t, &NoTeam);
    assert!(d.allowed);
}

// =============================================================
// Lock toggle
// =============================================================

#[test]
fn lock_toggle_only_admin_and_supervisor() {
    assert!(can_toggle_lock(&user(1, Role::Admin)));
    assert!(can_toggle_lock(&user(1, Role::Supervisor)));
    assert!(!can_toggle_lock(&user(1, Role::Delegate)));
    assert!(!can_toggle_lock(&user(1, Role::Viewer)));
}

#[test]
fn lock_toggle_independent_of_edit_scope() {
    let supervisor = user(1, Role::Supervisor);
    let denied = evaluate(&supervisor, RESOURCE, Action::Edit, target(Some(7), true), &table(Scope::None), &NoTeam);
    assert!(!denied.allowed);
    assert!(can_toggle_lock(&supervisor));

    let delegate = user(7, Role::Delegate);
    let allowed = evaluate(&delegate, RESOURCE, Action::Edit, target(Some(7), false), &table(Scope::All), &NoTeam);
    assert!(allowed.allowed);
    assert!(!can_toggle_lock(&delegate));
}

// =============================================================
// Team predicates
// =============================================================

#[test]
fn team_roster_scoped_to_its_actor() {
    let roster = TeamRoster::new(42, [7, 8]);
    assert!(roster.is_member(42, 7));
    assert!(roster.is_member(42, 42));
    assert!(!roster.is_member(42, 9));
    assert!(!roster.is_member(5, 7));
    assert!(roster.is_member(5, 5));
}

#[test]
fn record_access_bundles_decisions() {
    let mut record = crate::record::LocationRecord::new("X", "Cairo", 30.0, 31.0);
    record.owner_id = Some(7);
    record.is_locked = true;
    let access = record_access(&user(42, Role::Delegate), RESOURCE, &record, &table(Scope::Own), &NoTeam);
    assert!(access.view.allowed);
    assert_eq!(access.edit.reason, AccessReason::LockedNoPerm);
    assert_eq!(access.delete.reason, AccessReason::LockedNoPerm);
    assert!(!access.can_toggle_lock);
}
