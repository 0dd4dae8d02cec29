//! Undo/redo management for the editing session.
//!
//! History is snapshot-based: each step stores the whole document together
//! with the selection and the active spell-error set, so restoring a step
//! cannot leave a highlight behind for an error that no longer exists.
//! There is a single linear history; a fresh edit after undo discards the
//! redo branch.

use quire_api::SpellCheckReport;

use crate::document::Document;
use crate::selection::Selection;

/// One recorded history step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub doc: Document,
    pub selection: Selection,
    pub errors: SpellCheckReport,
}

/// Linear snapshot history with a bounded depth.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: Vec<Snapshot>,
    redo_stack: Vec<Snapshot>,
    max_steps: usize,
}

impl EditHistory {
    pub fn new(max_steps: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_steps,
        }
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Record the pre-edit state. Clears the redo branch.
    pub fn record(&mut self, snapshot: Snapshot) {
        self.redo_stack.clear();
        self.undo_stack.push(snapshot);
        while self.undo_stack.len() > self.max_steps {
            self.undo_stack.remove(0);
        }
    }

    /// Swap the current state for the last recorded one. Returns the state
    /// to restore, or None when there is nothing to undo.
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let restored = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(restored)
    }

    /// Inverse of [`Self::undo`].
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let restored = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(restored)
    }

    /// Clear all undo/redo history. Used when a different document is
    /// opened into the session.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}
