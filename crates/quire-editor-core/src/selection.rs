//! Selections over the document tree.
//!
//! A position names a text block plus an inline offset; a selection is an
//! anchor/focus pair. Offsets count one unit per run character and one unit
//! per embedded image, so every caret slot between inline items is
//! addressable.

use crate::document::{BlockPath, Document};

/// A caret slot inside a text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub path: BlockPath,
    pub offset: usize,
}

impl Position {
    pub fn new(path: BlockPath, offset: usize) -> Self {
        Position { path, offset }
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.path
            .cmp(&other.path)
            .then(self.offset.cmp(&other.offset))
    }
}

/// Anchor/focus pair. The focus is the moving end; a collapsed selection is
/// a caret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Position,
    pub focus: Position,
}

impl Selection {
    pub fn caret(position: Position) -> Self {
        Selection {
            anchor: position.clone(),
            focus: position,
        }
    }

    pub fn range(anchor: Position, focus: Position) -> Self {
        Selection { anchor, focus }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The earlier end in document order.
    pub fn start(&self) -> &Position {
        if self.anchor <= self.focus {
            &self.anchor
        } else {
            &self.focus
        }
    }

    /// The later end in document order.
    pub fn end(&self) -> &Position {
        if self.anchor <= self.focus {
            &self.focus
        } else {
            &self.anchor
        }
    }

    /// Whether both ends sit in the same block sequence, the precondition
    /// for range edits. Cross-cell selections fail this.
    pub fn is_single_sequence(&self) -> bool {
        self.anchor.path.same_sequence(&self.focus.path)
    }

    pub fn collapse_to_focus(&self) -> Self {
        Selection::caret(self.focus.clone())
    }

    pub fn collapse_to_anchor(&self) -> Self {
        Selection::caret(self.anchor.clone())
    }

    /// Clamp both ends to valid positions in `doc`.
    pub fn clamped(&self, doc: &Document) -> Self {
        Selection {
            anchor: doc.clamp_position(&self.anchor),
            focus: doc.clamp_position(&self.focus),
        }
    }
}
