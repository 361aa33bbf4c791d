//! Fragment selection model.
//!
//! Pure mapping from fragment identity to included/excluded, independent of
//! whatever front end renders the checkboxes. Selection never reorders
//! fragments; ordering is the assembler's job.

use crate::extract::{Fragment, FragmentKey};
use std::collections::BTreeMap;

/// Bulk selection actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkAction {
    /// Include every fragment.
    SelectAll,
    /// Exclude every fragment.
    ClearAll,
}

/// Per-fragment inclusion state for one conversion session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    map: BTreeMap<FragmentKey, bool>,
}

impl SelectionSet {
    /// Default selection: every fragment included.
    pub fn all_included(fragments: &[Fragment]) -> Self {
        let map = fragments.iter().map(|f| (f.key(), true)).collect();
        Self { map }
    }

    /// An empty selection set (no fragments). A blank page contributes
    /// nothing to the output; this is not an error.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Apply a bulk action to every entry. Idempotent.
    pub fn apply_bulk(&mut self, action: BulkAction) {
        let value = matches!(action, BulkAction::SelectAll);
        for included in self.map.values_mut() {
            *included = value;
        }
    }

    /// Flip one entry. Unknown keys are ignored.
    pub fn toggle(&mut self, key: FragmentKey) {
        if let Some(included) = self.map.get_mut(&key) {
            *included = !*included;
        }
    }

    /// Set one entry explicitly. Unknown keys are ignored.
    pub fn set(&mut self, key: FragmentKey, included: bool) {
        if let Some(entry) = self.map.get_mut(&key) {
            *entry = included;
        }
    }

    /// Whether the fragment with this key is included.
    pub fn is_included(&self, key: FragmentKey) -> bool {
        self.map.get(&key).copied().unwrap_or(false)
    }

    /// Number of tracked fragments.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when no fragments are tracked.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Number of included fragments.
    pub fn included_count(&self) -> usize {
        self.map.values().filter(|v| **v).count()
    }

    /// Iterate over `(key, included)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FragmentKey, bool)> + '_ {
        self.map.iter().map(|(k, v)| (*k, *v))
    }
}
