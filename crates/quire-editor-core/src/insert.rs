//! Structural insertion: tables, images, page breaks.
//!
//! Block-level content (tables, page breaks) splits the caret block in two
//! and lands between the halves, leaving the caret at the start of the
//! trailing half. Images are inline leaves and land at the caret itself.

use crate::config::InsertLimits;
use crate::document::Document;
use crate::edit::delete_selection;
use crate::error::EditError;
use crate::format::split_inline_at;
use crate::node::{Block, ImageNode, Inline, TableGrid, TextKind};
use crate::selection::{Position, Selection};

/// Insert an empty table grid at the caret. Dimensions outside the
/// configured range are rejected before any mutation happens.
pub fn insert_table(
    doc: &mut Document,
    selection: &Selection,
    rows: usize,
    cols: usize,
    limits: &InsertLimits,
) -> Result<Selection, EditError> {
    if rows < 1 || rows > limits.max_table_rows || cols < 1 || cols > limits.max_table_cols {
        return Err(EditError::TableSize {
            rows,
            cols,
            max_rows: limits.max_table_rows,
            max_cols: limits.max_table_cols,
        });
    }
    Ok(insert_block_at_caret(
        doc,
        selection,
        Block::table(TableGrid::new(rows, cols)),
    ))
}

/// Insert an image leaf at the caret. An empty source is a no-op, not an
/// error. Sizing and the interaction handle come from the enforcement pass
/// that follows every mutation.
pub fn insert_image(doc: &mut Document, selection: &Selection, src: &str) -> Selection {
    if src.is_empty() {
        return selection.clone();
    }
    let caret = delete_selection(doc, selection);
    let Some(block) = doc.block_mut(&caret.path) else {
        return Selection::caret(caret);
    };
    let Some(inlines) = block.inlines_mut() else {
        return Selection::caret(caret);
    };
    let index = split_inline_at(inlines, caret.offset);
    inlines.insert(index, Inline::Image(ImageNode::new(src)));
    Selection::caret(Position::new(caret.path, caret.offset + 1))
}

/// Insert a forced layout break as its own block.
pub fn insert_page_break(doc: &mut Document, selection: &Selection) -> Selection {
    insert_block_at_caret(doc, selection, Block::page_break())
}

fn insert_block_at_caret(doc: &mut Document, selection: &Selection, block: Block) -> Selection {
    let caret = delete_selection(doc, selection);
    let Some(current) = doc.block_mut(&caret.path) else {
        return Selection::caret(caret);
    };
    let kind = current.text_kind().unwrap_or(TextKind::Paragraph);
    let align = current.align;
    let indent = current.indent;
    let tail_inlines = match current.inlines_mut() {
        Some(inlines) => {
            let cut = split_inline_at(inlines, caret.offset);
            inlines.split_off(cut)
        }
        None => Vec::new(),
    };
    let mut tail = Block::text(kind, tail_inlines);
    tail.align = align;
    tail.indent = indent;

    let leaf = caret.path.leaf_index();
    if let Some(sequence) = doc.sequence_mut(caret.path.parent_steps()) {
        if leaf < sequence.len() {
            sequence.insert(leaf + 1, block);
            sequence.insert(leaf + 2, tail);
        }
    }
    Selection::caret(Position::new(caret.path.with_leaf_index(leaf + 2), 0))
}
