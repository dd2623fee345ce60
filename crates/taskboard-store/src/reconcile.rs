//! Association set reconciliation.
//!
//! Computes the minimal insert/delete sets that converge a task's
//! persisted user associations to a requested target set. Operates on
//! plain ids; applying the diff inside a transaction is the caller's
//! job ([`crate::db::TaskDb::edit_task`]).

use std::collections::BTreeSet;

/// The insert/delete sets for one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDiff {
    /// Rows to insert: requested, existing as users, not yet associated.
    pub add: Vec<i64>,
    /// Rows to delete: currently associated but no longer requested
    /// (or requested with an id that matches no user).
    pub remove: Vec<i64>,
}

impl AssociationDiff {
    /// Partition the association change.
    ///
    /// `requested` — caller-supplied target list (duplicates collapse).
    /// `existing` — the subset of requested ids that match real users;
    /// unknown ids are dropped silently, never materialized.
    /// `current` — user ids currently associated with the task.
    pub fn compute(requested: &[i64], existing: &[i64], current: &[i64]) -> Self {
        let existing: BTreeSet<i64> = existing.iter().copied().collect();
        let target: BTreeSet<i64> = requested
            .iter()
            .copied()
            .filter(|id| existing.contains(id))
            .collect();
        let current: BTreeSet<i64> = current.iter().copied().collect();

        Self {
            add: target.difference(&current).copied().collect(),
            remove: current.difference(&target).copied().collect(),
        }
    }

    pub fn is_noop(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_add_remove_keep() {
        // current {1,2}, requested {2,3}, all exist
        let diff = AssociationDiff::compute(&[2, 3], &[2, 3], &[1, 2]);
        assert_eq!(diff.add, vec![3]);
        assert_eq!(diff.remove, vec![1]);
    }

    #[test]
    fn unknown_ids_are_dropped() {
        let diff = AssociationDiff::compute(&[5, 999_999], &[5], &[]);
        assert_eq!(diff.add, vec![5]);
        assert!(diff.remove.is_empty());
    }

    #[test]
    fn unknown_id_already_associated_is_removed() {
        // a requested id that matches no user cannot keep a stale row alive
        let diff = AssociationDiff::compute(&[7], &[], &[7]);
        assert!(diff.add.is_empty());
        assert_eq!(diff.remove, vec![7]);
    }

    #[test]
    fn duplicates_collapse() {
        let diff = AssociationDiff::compute(&[4, 4, 4], &[4], &[]);
        assert_eq!(diff.add, vec![4]);
    }

    #[test]
    fn empty_request_removes_all() {
        let diff = AssociationDiff::compute(&[], &[], &[1, 2, 3]);
        assert!(diff.add.is_empty());
        assert_eq!(diff.remove, vec![1, 2, 3]);
    }

    #[test]
    fn unchanged_set_is_noop() {
        let diff = AssociationDiff::compute(&[1, 2], &[1, 2], &[1, 2]);
        assert!(diff.is_noop());
    }
}
