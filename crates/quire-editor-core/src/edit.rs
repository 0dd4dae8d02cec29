//! Text entry and deletion.
//!
//! Typing and deleting are range replacements: a non-collapsed selection is
//! removed first, then content lands at the resulting caret. Block merges
//! (backspace at a block start, delete at a block end) pull the neighbor's
//! inline content into the caret block; structural neighbors like tables and
//! page breaks are removed whole instead of being entered.

use crate::document::Document;
use crate::format::{caret_style, coalesce_runs, marker_index_at, split_inline_at};
use crate::node::{Block, BlockBody, Inline, Run, TextKind};
use crate::selection::{Position, Selection};

/// Insert text at the selection, replacing any selected range. Returns the
/// caret after the inserted text.
pub fn insert_text(doc: &mut Document, selection: &Selection, text: &str) -> Selection {
    let caret = delete_selection(doc, selection);
    if text.is_empty() {
        return Selection::caret(caret);
    }
    let Some(block) = doc.block_mut(&caret.path) else {
        return Selection::caret(caret);
    };
    let style = caret_style(block, caret.offset);
    let Some(inlines) = block.inlines_mut() else {
        return Selection::caret(caret);
    };
    let added = text.chars().count();

    // A caret hosted in a marker run consumes it: the zero-width character
    // is replaced by the typed text, which keeps the marker's style.
    if let Some(index) = marker_index_at(inlines, caret.offset) {
        if let Some(Inline::Run(run)) = inlines.get_mut(index) {
            run.text.clear();
            run.text.push_str(text);
        }
        coalesce_runs(inlines);
        return Selection::caret(Position::new(caret.path, caret.offset - 1 + added));
    }

    let index = split_inline_at(inlines, caret.offset);
    let mut extended = false;
    if index > 0 {
        if let Some(Inline::Run(prev)) = inlines.get_mut(index - 1) {
            if !prev.is_marker() {
                prev.text.push_str(text);
                extended = true;
            }
        }
    }
    if !extended {
        inlines.insert(index, Inline::Run(Run::styled(text, style)));
    }
    coalesce_runs(inlines);
    Selection::caret(Position::new(caret.path, caret.offset + added))
}

/// Split the caret block in two. The tail of a heading becomes a paragraph;
/// list items continue the list.
pub fn insert_paragraph(doc: &mut Document, selection: &Selection) -> Selection {
    let caret = delete_selection(doc, selection);
    let Some(block) = doc.block_mut(&caret.path) else {
        return Selection::caret(caret);
    };
    let kind = block.text_kind().unwrap_or(TextKind::Paragraph);
    let align = block.align;
    let indent = block.indent;
    let tail_inlines = match block.inlines_mut() {
        Some(inlines) => {
            let cut = split_inline_at(inlines, caret.offset);
            inlines.split_off(cut)
        }
        None => Vec::new(),
    };
    let tail_kind = match kind {
        TextKind::Heading(_) => TextKind::Paragraph,
        other => other,
    };
    let mut tail = Block::text(tail_kind, tail_inlines);
    tail.align = align;
    tail.indent = indent;

    let leaf = caret.path.leaf_index();
    if let Some(sequence) = doc.sequence_mut(caret.path.parent_steps()) {
        if leaf < sequence.len() {
            sequence.insert(leaf + 1, tail);
        }
    }
    Selection::caret(Position::new(caret.path.with_leaf_index(leaf + 1), 0))
}

/// Delete one unit left of the caret, or the selected range.
pub fn delete_backward(doc: &mut Document, selection: &Selection) -> Selection {
    if !selection.is_collapsed() {
        return Selection::caret(delete_selection(doc, selection));
    }
    let caret = doc.clamp_position(&selection.focus);
    if caret.offset > 0 {
        if let Some(block) = doc.block_mut(&caret.path) {
            if let Some(inlines) = block.inlines_mut() {
                remove_span(inlines, caret.offset - 1, caret.offset);
            }
        }
        return Selection::caret(Position::new(caret.path, caret.offset - 1));
    }

    let leaf = caret.path.leaf_index();
    if leaf == 0 {
        // Block sequence start: nothing to join with. Cell boundaries are
        // never crossed by deletion.
        return Selection::caret(caret);
    }
    let Some(sequence) = doc.sequence_mut(caret.path.parent_steps()) else {
        return Selection::caret(caret);
    };
    if sequence.get(leaf - 1).map(Block::is_text) == Some(true) {
        let current = sequence.remove(leaf);
        let mut offset = 0;
        if let Some(prev) = sequence.get_mut(leaf - 1) {
            offset = prev.inline_len();
            if let (Some(prev_inlines), BlockBody::Text { inlines, .. }) =
                (prev.inlines_mut(), current.body)
            {
                prev_inlines.extend(inlines);
                coalesce_runs(prev_inlines);
            }
        }
        Selection::caret(Position::new(caret.path.with_leaf_index(leaf - 1), offset))
    } else {
        // Structural neighbor: the whole table or page break goes at once.
        sequence.remove(leaf - 1);
        Selection::caret(Position::new(caret.path.with_leaf_index(leaf - 1), 0))
    }
}

/// Delete one unit right of the caret, or the selected range.
pub fn delete_forward(doc: &mut Document, selection: &Selection) -> Selection {
    if !selection.is_collapsed() {
        return Selection::caret(delete_selection(doc, selection));
    }
    let caret = doc.clamp_position(&selection.focus);
    let len = doc.block(&caret.path).map(Block::inline_len).unwrap_or(0);
    if caret.offset < len {
        if let Some(block) = doc.block_mut(&caret.path) {
            if let Some(inlines) = block.inlines_mut() {
                remove_span(inlines, caret.offset, caret.offset + 1);
            }
        }
        return Selection::caret(caret);
    }

    let leaf = caret.path.leaf_index();
    let Some(sequence) = doc.sequence_mut(caret.path.parent_steps()) else {
        return Selection::caret(caret);
    };
    if leaf + 1 >= sequence.len() {
        return Selection::caret(caret);
    }
    if sequence.get(leaf + 1).map(Block::is_text) == Some(true) {
        let next = sequence.remove(leaf + 1);
        if let Some(block) = sequence.get_mut(leaf) {
            if let (Some(inlines), BlockBody::Text { inlines: next_inlines, .. }) =
                (block.inlines_mut(), next.body)
            {
                inlines.extend(next_inlines);
                coalesce_runs(inlines);
            }
        }
    } else {
        sequence.remove(leaf + 1);
    }
    Selection::caret(caret)
}

/// Remove the selected range and return the collapsed caret. A selection
/// spanning table cells is not deletable and collapses to its anchor.
pub(crate) fn delete_selection(doc: &mut Document, selection: &Selection) -> Position {
    if selection.is_collapsed() {
        return doc.clamp_position(&selection.focus);
    }
    if !selection.is_single_sequence() {
        return doc.clamp_position(&selection.anchor);
    }
    let start = doc.clamp_position(selection.start());
    let end = doc.clamp_position(selection.end());
    let first = start.path.leaf_index();
    let last = end.path.leaf_index();

    if first == last {
        if let Some(block) = doc.block_mut(&start.path) {
            if let Some(inlines) = block.inlines_mut() {
                remove_span(inlines, start.offset, end.offset);
            }
        }
        return start;
    }

    if let Some(sequence) = doc.sequence_mut(start.path.parent_steps()) {
        let mut tail = Vec::new();
        if let Some(block) = sequence.get_mut(last) {
            if let Some(inlines) = block.inlines_mut() {
                let cut = split_inline_at(inlines, end.offset);
                inlines.drain(..cut);
                tail = std::mem::take(inlines);
            }
        }
        if let Some(block) = sequence.get_mut(first) {
            if let Some(inlines) = block.inlines_mut() {
                let cut = split_inline_at(inlines, start.offset);
                inlines.truncate(cut);
                inlines.extend(tail);
                coalesce_runs(inlines);
            }
        }
        if first + 1 <= last && last < sequence.len() {
            sequence.drain(first + 1..=last);
        }
    }
    start
}

fn remove_span(inlines: &mut Vec<Inline>, from: usize, to: usize) {
    let first = split_inline_at(inlines, from);
    let last = split_inline_at(inlines, to);
    inlines.drain(first..last);
    coalesce_runs(inlines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::BlockPath;
    use crate::format::{apply_style, StyleChange};
    use crate::node::{ImageNode, ListKind, TableGrid};
    use crate::style::{Style, StyleKind};

    fn run(text: &str) -> Inline {
        Inline::Run(Run::new(text))
    }

    fn para(text: &str) -> Block {
        Block::text(TextKind::Paragraph, vec![run(text)])
    }

    fn caret(block: usize, offset: usize) -> Selection {
        Selection::caret(Position::new(BlockPath::root(block), offset))
    }

    #[test]
    fn test_typing_extends_run_with_left_affinity() {
        let mut style = Style::default();
        style.bold = true;
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::Paragraph,
            vec![Inline::Run(Run::styled("ab", style)), run("cd")],
        )]);
        let after = insert_text(&mut doc, &caret(0, 2), "X");
        let inlines = doc.blocks[0].inlines().unwrap();
        assert_eq!(inlines.len(), 2);
        assert_eq!(inlines[0].as_run().unwrap().text, "abX");
        assert!(inlines[0].as_run().unwrap().style.bold);
        assert_eq!(after.focus.offset, 3);
    }

    #[test]
    fn test_typing_mid_run_keeps_single_run() {
        let mut doc = Document::from_blocks(vec![para("hello")]);
        let after = insert_text(&mut doc, &caret(0, 2), "xy");
        assert_eq!(doc.blocks[0].inlines().unwrap().len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "hexyllo");
        assert_eq!(after.focus.offset, 4);
    }

    #[test]
    fn test_typing_into_marker_consumes_it() {
        let mut doc = Document::from_blocks(vec![para("hi")]);
        let pending = apply_style(&mut doc, &caret(0, 1), &StyleChange::Toggle(StyleKind::Bold));
        let after = insert_text(&mut doc, &pending, "x");

        let inlines = doc.blocks[0].inlines().unwrap();
        assert!(inlines.iter().all(|inline| match inline {
            Inline::Run(run) => !run.is_marker(),
            _ => true,
        }));
        assert_eq!(doc.blocks[0].plain_text(), "hxi");
        assert!(inlines[1].as_run().unwrap().style.bold);
        assert_eq!(after.focus.offset, 2);
    }

    #[test]
    fn test_insert_replaces_selection() {
        let mut doc = Document::from_blocks(vec![para("hello world")]);
        let sel = Selection::range(
            Position::new(BlockPath::root(0), 5),
            Position::new(BlockPath::root(0), 11),
        );
        let after = insert_text(&mut doc, &sel, "!");
        assert_eq!(doc.blocks[0].plain_text(), "hello!");
        assert_eq!(after.focus.offset, 6);
    }

    #[test]
    fn test_enter_splits_block() {
        let mut doc = Document::from_blocks(vec![para("hello")]);
        let after = insert_paragraph(&mut doc, &caret(0, 2));
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0].plain_text(), "he");
        assert_eq!(doc.blocks[1].plain_text(), "llo");
        assert_eq!(after.focus.path, BlockPath::root(1));
        assert_eq!(after.focus.offset, 0);
    }

    #[test]
    fn test_enter_after_heading_starts_paragraph() {
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::Heading(1),
            vec![run("TITLE")],
        )]);
        insert_paragraph(&mut doc, &caret(0, 5));
        assert_eq!(doc.blocks[0].text_kind(), Some(TextKind::Heading(1)));
        assert_eq!(doc.blocks[1].text_kind(), Some(TextKind::Paragraph));
    }

    #[test]
    fn test_enter_continues_list() {
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::ListItem(ListKind::Ordered),
            vec![run("item")],
        )]);
        insert_paragraph(&mut doc, &caret(0, 4));
        assert_eq!(
            doc.blocks[1].text_kind(),
            Some(TextKind::ListItem(ListKind::Ordered))
        );
    }

    #[test]
    fn test_backspace_deletes_one_char() {
        let mut doc = Document::from_blocks(vec![para("ab")]);
        let after = delete_backward(&mut doc, &caret(0, 2));
        assert_eq!(doc.blocks[0].plain_text(), "a");
        assert_eq!(after.focus.offset, 1);
    }

    #[test]
    fn test_backspace_merges_blocks() {
        let mut doc = Document::from_blocks(vec![para("ab"), para("cd")]);
        let after = delete_backward(&mut doc, &caret(1, 0));
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "abcd");
        assert_eq!(after.focus.path, BlockPath::root(0));
        assert_eq!(after.focus.offset, 2);
    }

    #[test]
    fn test_backspace_removes_table_whole() {
        let mut doc = Document::from_blocks(vec![
            para("a"),
            Block::table(TableGrid::new(2, 2)),
            para("b"),
        ]);
        let after = delete_backward(&mut doc, &caret(2, 0));
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc.blocks.iter().all(Block::is_text));
        assert_eq!(after.focus.path, BlockPath::root(1));
    }

    #[test]
    fn test_backspace_at_document_start_is_noop() {
        let mut doc = Document::from_blocks(vec![para("ab")]);
        let after = delete_backward(&mut doc, &caret(0, 0));
        assert_eq!(doc.blocks[0].plain_text(), "ab");
        assert_eq!(after.focus.offset, 0);
    }

    #[test]
    fn test_backspace_removes_image_unit() {
        let mut doc = Document::from_blocks(vec![Block::text(
            TextKind::Paragraph,
            vec![run("a"), Inline::Image(ImageNode::new("pic.png")), run("b")],
        )]);
        let after = delete_backward(&mut doc, &caret(0, 2));
        assert_eq!(doc.blocks[0].inlines().unwrap().len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "ab");
        assert_eq!(after.focus.offset, 1);
    }

    #[test]
    fn test_delete_forward_merges_blocks() {
        let mut doc = Document::from_blocks(vec![para("ab"), para("cd")]);
        let after = delete_forward(&mut doc, &caret(0, 2));
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "abcd");
        assert_eq!(after.focus.offset, 2);
    }

    #[test]
    fn test_delete_forward_removes_page_break_whole() {
        let mut doc = Document::from_blocks(vec![para("a"), Block::page_break(), para("b")]);
        delete_forward(&mut doc, &caret(0, 1));
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc.blocks.iter().all(Block::is_text));
    }

    #[test]
    fn test_range_delete_across_blocks() {
        let mut doc = Document::from_blocks(vec![para("abc"), para("def")]);
        let sel = Selection::range(
            Position::new(BlockPath::root(0), 1),
            Position::new(BlockPath::root(1), 2),
        );
        let after = insert_text(&mut doc, &sel, "");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "af");
        assert_eq!(after.focus.offset, 1);
    }

    #[test]
    fn test_range_delete_swallows_covered_table() {
        let mut doc = Document::from_blocks(vec![
            para("abc"),
            Block::table(TableGrid::new(1, 1)),
            para("xyz"),
        ]);
        let sel = Selection::range(
            Position::new(BlockPath::root(0), 1),
            Position::new(BlockPath::root(2), 2),
        );
        insert_text(&mut doc, &sel, "");
        assert_eq!(doc.blocks.len(), 1);
        assert_eq!(doc.blocks[0].plain_text(), "az");
    }

    #[test]
    fn test_cross_cell_selection_collapses_to_anchor() {
        let mut grid = TableGrid::new(1, 2);
        grid.cell_mut(0, 0).unwrap().blocks = vec![para("left")];
        grid.cell_mut(0, 1).unwrap().blocks = vec![para("right")];
        let mut doc = Document::from_blocks(vec![Block::table(grid)]);
        let anchor = Position::new(BlockPath::root(0).into_cell(0, 0, 0), 1);
        let focus = Position::new(BlockPath::root(0).into_cell(0, 1, 0), 2);
        let sel = Selection::range(anchor.clone(), focus);

        let after = delete_backward(&mut doc, &sel);
        assert_eq!(after.focus, anchor);
        assert_eq!(doc.block(&anchor.path).unwrap().plain_text(), "left");
    }
}
