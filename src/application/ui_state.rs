//! Transient per-node UI state kept beside the tree
//!
//! Selection, collapse and "newly modified" flags are keyed by node id and never take part in
//! serialization, equality or history.

use std::collections::HashSet;

use crate::domain::{EaogTree, NodeId};

#[derive(Debug, Default, Clone)]
pub struct UiState {
    selected: Vec<NodeId>,
    collapsed: HashSet<NodeId>,
    newly_modified: HashSet<NodeId>,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle selection of `id`. Without `multi` every other selection is cleared.
    pub fn select(&mut self, id: NodeId, multi: bool) {
        let was_selected = self.is_selected(id);
        if !multi {
            self.selected.clear();
        }
        if was_selected {
            self.selected.retain(|&s| s != id);
        } else {
            self.selected.push(id);
        }
    }

    pub fn deselect(&mut self, id: NodeId) {
        self.selected.retain(|&s| s != id);
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, id: NodeId) -> bool {
        self.selected.contains(&id)
    }

    /// Selected nodes in selection order.
    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    /// Returns the new collapsed state.
    pub fn toggle_collapse(&mut self, id: NodeId) -> bool {
        if self.collapsed.remove(&id) {
            false
        } else {
            self.collapsed.insert(id);
            true
        }
    }

    pub fn is_collapsed(&self, id: NodeId) -> bool {
        self.collapsed.contains(&id)
    }

    pub fn mark_newly_modified(&mut self, id: NodeId) {
        self.newly_modified.insert(id);
    }

    pub fn clear_newly_modified(&mut self) {
        self.newly_modified.clear();
    }

    pub fn is_newly_modified(&self, id: NodeId) -> bool {
        self.newly_modified.contains(&id)
    }

    /// Forget entries for nodes no longer attached to `tree`.
    pub fn retain_existing(&mut self, tree: &EaogTree) {
        self.selected.retain(|&id| tree.is_attached(id));
        self.collapsed.retain(|&id| tree.is_attached(id));
        self.newly_modified.retain(|&id| tree.is_attached(id));
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.collapsed.clear();
        self.newly_modified.clear();
    }
}
