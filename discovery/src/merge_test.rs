use super::*;
use crate::record::LocationRecord;

fn rec(id: i64, city: &str) -> LocationRecord {
    let mut r = LocationRecord::new(format!("C-{id}"), city, 30.0, 31.0);
    r.id = RecordId::Assigned(id);
    r
}

fn pending(city: &str) -> LocationRecord {
    LocationRecord::new(format!("P-{city}"), city, 30.0, 31.0)
}

fn ids(items: &[LocationRecord]) -> Vec<RecordId> {
    items.iter().map(|r| r.id).collect()
}

#[test]
fn merge_empty_inputs() {
    let out: Vec<LocationRecord> = merge_by_identity(Vec::new(), Vec::new());
    assert!(out.is_empty());
}

#[test]
fn merge_disjoint_keeps_everything() {
    let out = merge_by_identity(vec![rec(1, "a"), rec(2, "b")], vec![rec(3, "c")]);
    assert_eq!(ids(&out), vec![RecordId::Assigned(3), RecordId::Assigned(1), RecordId::Assigned(2)]);
}

#[test]
fn merge_priority_wins_on_collision() {
    let out = merge_by_identity(vec![rec(1, "stale"), rec(2, "b")], vec![rec(1, "fresh")]);
    assert_eq!(out.len(), 2);
    let one = out.iter().find(|r| r.id == RecordId::Assigned(1)).unwrap();
    assert_eq!(one.city, "fresh");
}

#[test]
fn merge_is_unique_by_identity() {
    let out = merge_by_identity(
        vec![rec(1, "a"), rec(1, "a-dup"), rec(2, "b")],
        vec![rec(2, "b-priority"), rec(3, "c"), rec(3, "c-dup")],
    );
    let mut seen = ids(&out);
    seen.sort_by_key(|id| id.assigned());
    seen.dedup();
    assert_eq!(seen.len(), out.len());
    assert_eq!(out.len(), 3);
}

#[test]
fn merge_is_idempotent() {
    let general = vec![rec(1, "a"), rec(2, "b"), rec(4, "d")];
    let priority = vec![rec(2, "b2"), rec(3, "c")];
    let first = merge_by_identity(general.clone(), priority.clone());
    let second = merge_by_identity(general, priority);
    assert_eq!(first, second);

    let again = merge_by_identity(first.clone(), first.clone());
    assert_eq!(again, first);
}

#[test]
fn merge_keeps_every_pending_record() {
    let out = merge_by_identity(vec![pending("x"), rec(1, "a")], vec![pending("y"), pending("z")]);
    assert_eq!(out.iter().filter(|r| r.id.is_pending()).count(), 3);
    assert_eq!(out.len(), 4);
}

#[test]
fn merge_priority_only_records_are_not_dropped() {
    let out = merge_by_identity(vec![rec(1, "a")], vec![rec(99, "only-nearby")]);
    assert!(out.iter().any(|r| r.city == "only-nearby"));
}
