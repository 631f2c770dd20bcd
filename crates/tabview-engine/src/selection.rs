//! Selection state: which records are marked for bulk action
//!
//! Selection persists across pagination and sort changes, but is kept a
//! subset of the full record set by pruning whenever the record set
//! changes.

use std::collections::HashSet;

/// Set of selected record ids
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: HashSet<String>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or remove one id. Returns whether the set changed.
    pub fn toggle(&mut self, id: &str, checked: bool) -> bool {
        if checked {
            self.selected.insert(id.to_string())
        } else {
            self.selected.remove(id)
        }
    }

    /// Add or remove a batch of ids. Returns whether the set changed.
    pub fn toggle_all<I, S>(&mut self, ids: I, checked: bool) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changed = false;
        for id in ids {
            changed |= self.toggle(id.as_ref(), checked);
        }
        changed
    }

    /// Empty the set. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        if self.selected.is_empty() {
            false
        } else {
            self.selected.clear();
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn count(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected ids in a stable (sorted) order
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.selected.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop ids that no longer exist in the record set. Returns whether
    /// anything was pruned.
    pub fn retain_existing(&mut self, existing: &HashSet<&str>) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| existing.contains(id.as_str()));
        self.selected.len() < before
    }
}
