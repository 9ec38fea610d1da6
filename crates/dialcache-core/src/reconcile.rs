//! Pure reconciliation of a local record map against a source delta.
//!
//! Both sync domains (contacts, call log) run the same algorithm; only
//! the record type differs. Deletion is inferred from absence in the
//! full id enumeration - the source never pushes explicit deletes.

use std::collections::{HashMap, HashSet};

use crate::models::Record;

/// Outcome of one reconciliation pass
#[derive(Debug, Clone)]
pub struct Reconciliation<R> {
    /// The reconciled record map
    pub state: HashMap<i64, R>,
    /// Delta records whose id was not previously present
    pub added: Vec<R>,
    /// Delta records that replaced an existing entry
    pub updated: Vec<R>,
    /// Ids dropped because they were absent from the full enumeration
    pub removed_ids: HashSet<i64>,
}

impl<R: Record> Reconciliation<R> {
    /// All records that need persisting after this pass (added + updated)
    #[must_use]
    pub fn changed(&self) -> Vec<R> {
        self.added
            .iter()
            .chain(self.updated.iter())
            .cloned()
            .collect()
    }

    /// Whether the pass observed any difference at all
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed_ids.is_empty()
    }
}

/// Merge `delta` into `current` and, when `full_ids` is given, drop every
/// entry whose id the source no longer enumerates.
///
/// The delta record always wins over the old value; no field-level diffing
/// is attempted. With `full_ids` absent no removal occurs - used while
/// paging in a bootstrap, when the caller has a known-good partial delta
/// but no census yet. Deterministic and idempotent for the same inputs.
pub fn reconcile<R: Record>(
    current: &HashMap<i64, R>,
    delta: Vec<R>,
    full_ids: Option<&HashSet<i64>>,
) -> Reconciliation<R> {
    let mut state = current.clone();
    let mut added = Vec::new();
    let mut updated = Vec::new();

    for record in delta {
        if state.insert(record.id(), record.clone()).is_some() {
            updated.push(record);
        } else {
            added.push(record);
        }
    }

    let removed_ids: HashSet<i64> = match full_ids {
        Some(full_ids) => {
            let gone: HashSet<i64> = state
                .keys()
                .filter(|id| !full_ids.contains(id))
                .copied()
                .collect();
            for id in &gone {
                state.remove(id);
            }
            gone
        }
        None => HashSet::new(),
    };

    Reconciliation {
        state,
        added,
        updated,
        removed_ids,
    }
}
