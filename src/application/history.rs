//! Linear undo/redo history of tree snapshots
//!
//! Entries are independent clones; the entry at the cursor always mirrors the displayed tree.
//! Recording from a non-tip cursor abandons the redo branch.

use tracing::debug;

use crate::domain::EaogTree;

#[derive(Debug, Default)]
pub struct History {
    entries: Vec<EaogTree>,
    cursor: usize,
}

impl History {
    /// History whose first entry is a snapshot of `initial`.
    pub fn new(initial: &EaogTree) -> Self {
        Self {
            entries: vec![initial.clone_tree()],
            cursor: 0,
        }
    }

    /// Record a snapshot of `tree`.
    ///
    /// Entries after the cursor are dropped first; the record is then a no-op when `tree`
    /// equals the entry at the cursor. Returns whether an entry was appended.
    pub fn record(&mut self, tree: &EaogTree) -> bool {
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        if self.entries.last().is_some_and(|last| last == tree) {
            debug!("record: unchanged, skipping");
            return false;
        }
        self.entries.push(tree.clone_tree());
        self.cursor = self.entries.len() - 1;
        debug!("record: {} entries, cursor={}", self.entries.len(), self.cursor);
        true
    }

    /// Step back and return a copy of the entry now at the cursor.
    pub fn undo(&mut self) -> Option<EaogTree> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        debug!("undo: cursor={}", self.cursor);
        self.current()
    }

    /// Step forward and return a copy of the entry now at the cursor.
    pub fn redo(&mut self) -> Option<EaogTree> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        debug!("redo: cursor={}", self.cursor);
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Copy of the entry at the cursor.
    pub fn current(&self) -> Option<EaogTree> {
        self.entries.get(self.cursor).map(EaogTree::clone_tree)
    }
}
