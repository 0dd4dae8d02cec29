//! Tree-splice formatting engine.
//!
//! All styling is expressed as explicit run splits and merges over the block
//! tree. Range operations isolate the covered run segments, rewrite their
//! styles, then merge equal neighbors back together, so double application
//! of any toggle restores the original tree shape. Collapsed selections get
//! a zero-width marker run that carries the pending style for the next
//! typed character; [`prune_markers`] drops markers the caret has left.

use smol_str::SmolStr;

use crate::document::Document;
use crate::node::{Block, BlockBody, Inline, ListKind, Run, TextKind};
use crate::selection::{Position, Selection};
use crate::style::{heading_case, Alignment, Style, StyleKind};

/// One requested change to run-level styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleChange {
    Toggle(StyleKind),
    FontFamily(SmolStr),
    FontSize(u8),
    TextColor(SmolStr),
    Highlight(SmolStr),
}

impl StyleChange {
    fn apply(&self, style: &mut Style) {
        match self {
            StyleChange::Toggle(kind) => style.toggle(*kind),
            StyleChange::FontFamily(name) => style.font_family = Some(name.clone()),
            StyleChange::FontSize(size) => style.font_size = Some(*size),
            StyleChange::TextColor(color) => style.color = Some(color.clone()),
            StyleChange::Highlight(color) => style.highlight = Some(color.clone()),
        }
    }
}

/// Apply a run-style change over the selection and return the selection to
/// restore afterwards.
///
/// A collapsed caret gets (or updates) a marker run instead; a selection
/// spanning table cells falls back to its anchor caret.
pub fn apply_style(doc: &mut Document, selection: &Selection, change: &StyleChange) -> Selection {
    if selection.is_collapsed() {
        return style_at_caret(doc, &selection.focus, change);
    }
    if !selection.is_single_sequence() {
        return style_at_caret(doc, &selection.anchor, change);
    }

    let start = selection.start().clone();
    let end = selection.end().clone();
    let pieces = covered_pieces(doc, &start, &end);
    if let Some(sequence) = doc.sequence_mut(start.path.parent_steps()) {
        for (leaf, from, to) in pieces {
            let Some(block) = sequence.get_mut(leaf) else {
                continue;
            };
            let Some(inlines) = block.inlines_mut() else {
                continue;
            };
            let first = split_inline_at(inlines, from);
            let last = split_inline_at(inlines, to);
            for inline in &mut inlines[first..last] {
                if let Inline::Run(run) = inline {
                    change.apply(&mut run.style);
                }
            }
            coalesce_runs(inlines);
        }
    }
    selection.clone()
}

fn style_at_caret(doc: &mut Document, position: &Position, change: &StyleChange) -> Selection {
    let position = doc.clamp_position(position);
    let Some(block) = doc.block_mut(&position.path) else {
        return Selection::caret(position);
    };
    let base = caret_style(block, position.offset);
    let Some(inlines) = block.inlines_mut() else {
        return Selection::caret(position);
    };
    if let Some(index) = marker_index_at(inlines, position.offset) {
        if let Some(Inline::Run(run)) = inlines.get_mut(index) {
            change.apply(&mut run.style);
        }
        return Selection::caret(position);
    }
    let mut style = base;
    change.apply(&mut style);
    let index = split_inline_at(inlines, position.offset);
    inlines.insert(index, Inline::Run(Run::marker(style)));
    Selection::caret(Position::new(position.path, position.offset + 1))
}

/// The style continued typing at this caret would inherit. The run ending
/// at the offset wins over the run starting there.
pub fn caret_style(block: &Block, offset: usize) -> Style {
    let Some(inlines) = block.inlines() else {
        return Style::default();
    };
    if offset == 0 {
        return match inlines.first() {
            Some(Inline::Run(run)) => run.style.clone(),
            _ => Style::default(),
        };
    }
    let mut acc = 0;
    for inline in inlines {
        let len = inline.len();
        if offset > acc && offset <= acc + len {
            return match inline {
                Inline::Run(run) => run.style.clone(),
                Inline::Image(_) => Style::default(),
            };
        }
        acc += len;
    }
    Style::default()
}

/// Set alignment on every block the selection touches.
pub fn set_alignment(doc: &mut Document, selection: &Selection, align: Alignment) -> Selection {
    for_covered_blocks(doc, selection, &mut |block| block.align = align);
    selection.clone()
}

/// Adjust indent on every block the selection touches, clamped to
/// `0..=max_indent`.
pub fn change_indent(
    doc: &mut Document,
    selection: &Selection,
    delta: i8,
    max_indent: u8,
) -> Selection {
    for_covered_blocks(doc, selection, &mut |block| {
        let next = block.indent as i16 + delta as i16;
        block.indent = next.clamp(0, max_indent as i16) as u8;
    });
    selection.clone()
}

/// Toggle list membership: if every covered text block already is a list
/// item of this kind, all revert to paragraphs; otherwise all become items.
pub fn toggle_list(doc: &mut Document, selection: &Selection, kind: ListKind) -> Selection {
    let mut all_match = true;
    let mut seen_text = false;
    for_covered_blocks(doc, selection, &mut |block| {
        if block.is_text() {
            seen_text = true;
            if block.text_kind() != Some(TextKind::ListItem(kind)) {
                all_match = false;
            }
        }
    });
    if !seen_text {
        return selection.clone();
    }
    let target = if all_match {
        TextKind::Paragraph
    } else {
        TextKind::ListItem(kind)
    };
    for_covered_blocks(doc, selection, &mut |block| {
        if block.is_text() {
            block.set_text_kind(target);
        }
    });
    selection.clone()
}

/// Toggle the start block between heading and paragraph.
///
/// Demotion keeps the inline content verbatim. Promotion flattens the block
/// to a single plain run of its text with the level's case transform
/// applied, dropping images and per-run styling. That loss is one-way.
pub fn toggle_heading(doc: &mut Document, selection: &Selection, level: u8) -> Selection {
    let level = level.clamp(1, 6);
    let position = doc.clamp_position(selection.start());
    let Some(block) = doc.block_mut(&position.path) else {
        return Selection::caret(position);
    };
    match block.text_kind() {
        Some(TextKind::Heading(_)) => {
            block.set_text_kind(TextKind::Paragraph);
            Selection::caret(position)
        }
        Some(_) => {
            let text = heading_case(level, &block.plain_text());
            let inlines = if text.is_empty() {
                Vec::new()
            } else {
                vec![Inline::Run(Run::new(text))]
            };
            block.body = BlockBody::Text {
                kind: TextKind::Heading(level),
                inlines,
            };
            let offset = block.inline_len();
            Selection::caret(Position::new(position.path, offset))
        }
        None => Selection::caret(position),
    }
}

/// Remove every zero-width marker run the caret is not sitting in, shifting
/// the selection offsets across removed markers.
pub fn prune_markers(doc: &mut Document, selection: &mut Selection) {
    let keep = if selection.is_collapsed() {
        Some(selection.focus.clone())
    } else {
        None
    };
    let mut anchor = selection.anchor.clone();
    let mut focus = selection.focus.clone();
    doc.for_each_text_block_path_mut(&mut |path, block| {
        let Some(inlines) = block.inlines_mut() else {
            return;
        };
        let mut removed_at = Vec::new();
        let mut acc = 0usize;
        let mut index = 0;
        while index < inlines.len() {
            let len = inlines[index].len();
            let hosted = matches!(
                &keep,
                Some(k) if k.path == *path && k.offset == acc + 1
            );
            let prunable = match &inlines[index] {
                Inline::Run(run) => run.is_marker() && !hosted,
                _ => false,
            };
            if prunable {
                inlines.remove(index);
                removed_at.push(acc);
            } else {
                index += 1;
            }
            acc += len;
        }
        for position in [&mut anchor, &mut focus] {
            if position.path == *path {
                let shift = removed_at
                    .iter()
                    .filter(|start| **start < position.offset)
                    .count();
                position.offset -= shift.min(position.offset);
            }
        }
    });
    selection.anchor = anchor;
    selection.focus = focus;
}

/// Vec index of the inline boundary at `offset`, splitting a run in place
/// if the offset falls inside one.
pub(crate) fn split_inline_at(inlines: &mut Vec<Inline>, offset: usize) -> usize {
    let mut acc = 0usize;
    for index in 0..inlines.len() {
        if acc == offset {
            return index;
        }
        let len = inlines[index].len();
        if offset < acc + len {
            if let Inline::Run(run) = &mut inlines[index] {
                let split = offset - acc;
                let byte = run
                    .text
                    .char_indices()
                    .nth(split)
                    .map(|(byte, _)| byte)
                    .unwrap_or(run.text.len());
                let tail_text = run.text.split_off(byte);
                let tail = Run {
                    text: tail_text,
                    style: run.style.clone(),
                    mark: run.mark.clone(),
                };
                inlines.insert(index + 1, Inline::Run(tail));
                return index + 1;
            }
            return index;
        }
        acc += len;
    }
    inlines.len()
}

/// Merge adjacent non-marker runs with equal style and mark, and drop
/// zero-length runs.
pub(crate) fn coalesce_runs(inlines: &mut Vec<Inline>) {
    inlines.retain(|inline| !inline.is_empty());
    let mut index = 1;
    while index < inlines.len() {
        let mergeable = match (&inlines[index - 1], &inlines[index]) {
            (Inline::Run(a), Inline::Run(b)) => {
                !a.is_marker() && !b.is_marker() && a.style == b.style && a.mark == b.mark
            }
            _ => false,
        };
        if mergeable {
            if let Inline::Run(tail) = inlines.remove(index) {
                if let Some(Inline::Run(head)) = inlines.get_mut(index - 1) {
                    head.text.push_str(&tail.text);
                }
            }
        } else {
            index += 1;
        }
    }
}

pub(crate) fn marker_index_at(inlines: &[Inline], offset: usize) -> Option<usize> {
    let mut acc = 0;
    for (index, inline) in inlines.iter().enumerate() {
        let len = inline.len();
        if acc + len == offset {
            if let Inline::Run(run) = inline {
                if run.is_marker() {
                    return Some(index);
                }
            }
        }
        acc += len;
    }
    None
}

fn covered_pieces(
    doc: &Document,
    start: &Position,
    end: &Position,
) -> Vec<(usize, usize, usize)> {
    let Some(sequence) = doc.sequence(start.path.parent_steps()) else {
        return Vec::new();
    };
    let first = start.path.leaf_index();
    let last = end.path.leaf_index().min(sequence.len().saturating_sub(1));
    let mut pieces = Vec::new();
    for leaf in first..=last {
        let Some(block) = sequence.get(leaf) else {
            continue;
        };
        if !block.is_text() {
            continue;
        }
        let from = if leaf == first { start.offset } else { 0 };
        let to = if leaf == last {
            end.offset.min(block.inline_len())
        } else {
            block.inline_len()
        };
        if from <= to {
            pieces.push((leaf, from, to));
        }
    }
    pieces
}

fn for_covered_blocks(doc: &mut Document, selection: &Selection, edit: &mut impl FnMut(&mut Block)) {
    if !selection.is_single_sequence() {
        if let Some(block) = doc.block_mut(&selection.anchor.path) {
            edit(block);
        }
        return;
    }
    let first = selection.start().path.leaf_index();
    let last = selection.end().path.leaf_index();
    if let Some(sequence) = doc.sequence_mut(selection.start().path.parent_steps()) {
        for leaf in first..=last.min(sequence.len().saturating_sub(1)) {
            if let Some(block) = sequence.get_mut(leaf) {
                edit(block);
            }
        }
    }
}
