//! Identity-based merge of a general pool with a priority list.
//!
//! The priority list usually comes from a targeted nearby query and may hold
//! records the bulk pool missed or fresher copies of ones it has. On an
//! identity collision the priority entry wins. Output order is priority
//! entries first, then the unshadowed general entries, each in input order.

#[cfg(test)]
#[path = "merge_test.rs"]
mod merge_test;

use std::collections::HashSet;

use crate::record::{Identified, RecordId};

/// Combine `general` and `priority` into one list unique by identity.
///
/// Pending identities never collide, so every pending entry survives.
#[must_use]
pub fn merge_by_identity<T>(general: Vec<T>, priority: Vec<T>) -> Vec<T>
where
    T: Identified,
{
    let mut seen: HashSet<i64> = HashSet::with_capacity(general.len() + priority.len());
    let mut merged = Vec::with_capacity(general.len() + priority.len());

    for item in priority.into_iter().chain(general) {
        match item.identity() {
            RecordId::Pending => merged.push(item),
            RecordId::Assigned(id) => {
                if seen.insert(id) {
                    merged.push(item);
                }
            }
        }
    }

    merged
}
