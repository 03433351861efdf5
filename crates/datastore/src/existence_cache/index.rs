//! In-memory index of keys known to exist in the remote store.

use std::collections::HashSet;
use std::sync::Mutex;

/// Population state of the index.
///
/// `Pending` transitions to `Ready` exactly once, when the bulk listing
/// snapshot is merged. `Failed` is terminal: the owning wrapper stays on
/// the fallback path for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Readiness {
    Pending,
    Ready,
    Failed,
}

/// Existence index for one namespace.
///
/// All fields live behind a single mutex so read-then-write sequences on
/// the key set are atomic under concurrent callers. The lock is only held
/// for synchronous map operations, never across an await point.
pub(crate) struct ExistenceIndex {
    state: Mutex<IndexState>,
}

struct IndexState {
    readiness: Readiness,
    /// Keys known to exist. Absence is modeled by omission.
    entries: HashSet<String>,
    /// Keys deleted while population was pending. Subtracted from the
    /// listing snapshot on merge so a delete that raced the bulk listing
    /// cannot be resurrected by it.
    pending_removals: HashSet<String>,
}

impl ExistenceIndex {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(IndexState {
                readiness: Readiness::Pending,
                entries: HashSet::new(),
                pending_removals: HashSet::new(),
            }),
        }
    }

    /// Membership answer, or None while the index is not ready.
    pub(crate) fn contains(&self, key: &str) -> Option<bool> {
        let state = self.state.lock().unwrap();
        match state.readiness {
            Readiness::Ready => Some(state.entries.contains(key)),
            Readiness::Pending | Readiness::Failed => None,
        }
    }

    /// Record a key as present after a successful write.
    pub(crate) fn insert(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        state.pending_removals.remove(key);
        state.entries.insert(key.to_string());
    }

    /// Remove a key. Idempotent; recording works whether or not the key
    /// was ever present and whether or not population has completed.
    pub(crate) fn remove(&self, key: &str) {
        let mut state = self.state.lock().unwrap();
        state.entries.remove(key);
        if state.readiness == Readiness::Pending {
            state.pending_removals.insert(key.to_string());
        }
    }

    /// Merge the bulk listing snapshot into the live key set and mark the
    /// index ready.
    ///
    /// Keys put while the listing ran are already in `entries` and are
    /// kept; keys deleted while it ran are in `pending_removals` and are
    /// excluded even when the snapshot saw them.
    ///
    /// # Returns
    /// The number of entries after the merge.
    pub(crate) fn merge_snapshot(&self, snapshot: Vec<String>) -> usize {
        let mut state = self.state.lock().unwrap();
        if state.readiness != Readiness::Pending {
            return state.entries.len();
        }
        state.entries.extend(snapshot);
        let removals: Vec<String> = state.pending_removals.drain().collect();
        for key in &removals {
            state.entries.remove(key);
        }
        state.readiness = Readiness::Ready;
        state.entries.len()
    }

    /// Mark population as failed. The index never becomes ready afterwards.
    pub(crate) fn mark_failed(&self) {
        let mut state = self.state.lock().unwrap();
        if state.readiness == Readiness::Pending {
            state.readiness = Readiness::Failed;
            state.pending_removals.clear();
        }
    }

    pub(crate) fn readiness(&self) -> Readiness {
        self.state.lock().unwrap().readiness
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_consulted_while_pending() {
        let index = ExistenceIndex::new();
        index.insert("a");
        assert_eq!(index.contains("a"), None);
    }

    #[test]
    fn test_merge_keeps_concurrent_puts() {
        let index = ExistenceIndex::new();
        index.insert("d");
        index.merge_snapshot(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(index.contains("a"), Some(true));
        assert_eq!(index.contains("d"), Some(true));
        assert_eq!(index.contains("z"), Some(false));
    }

    #[test]
    fn test_merge_does_not_resurrect_deleted_keys() {
        let index = ExistenceIndex::new();
        index.remove("a");
        // Snapshot was taken before the delete and still lists "a".
        index.merge_snapshot(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(index.contains("a"), Some(false));
        assert_eq!(index.contains("b"), Some(true));
    }

    #[test]
    fn test_put_after_delete_clears_tombstone() {
        let index = ExistenceIndex::new();
        index.remove("a");
        index.insert("a");
        index.merge_snapshot(Vec::new());
        assert_eq!(index.contains("a"), Some(true));
    }

    #[test]
    fn test_ready_transitions_exactly_once() {
        let index = ExistenceIndex::new();
        index.merge_snapshot(vec!["a".to_string()]);
        assert_eq!(index.readiness(), Readiness::Ready);
        // A second merge must not replace the live set.
        index.merge_snapshot(vec!["other".to_string()]);
        assert_eq!(index.contains("a"), Some(true));
        assert_eq!(index.contains("other"), Some(false));
    }

    #[test]
    fn test_failed_is_terminal() {
        let index = ExistenceIndex::new();
        index.mark_failed();
        index.merge_snapshot(vec!["a".to_string()]);
        assert_eq!(index.readiness(), Readiness::Failed);
        assert_eq!(index.contains("a"), None);
    }
}
