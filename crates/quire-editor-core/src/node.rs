//! Content tree node types: blocks, inline runs, embedded images, tables.
//!
//! Inline offsets throughout the crate count one unit per run character and
//! one unit per embedded image. A zero-width marker run (a single U+200B
//! char) is the only legal zero-visible-width inline; it carries a style for
//! the next typed character and is pruned when the caret leaves it.

use smol_str::SmolStr;

use crate::style::{Alignment, Style};

/// The character a pending style marker run consists of.
pub const MARKER_CHAR: char = '\u{200B}';

/// A contiguous text span sharing one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub text: String,
    pub style: Style,
    /// Spell-check highlight: the flagged word this run is part of.
    pub mark: Option<SmolStr>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: Style::default(),
            mark: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
            mark: None,
        }
    }

    /// A zero-width marker carrying `style` for future typed input.
    pub fn marker(style: Style) -> Self {
        Self {
            text: MARKER_CHAR.to_string(),
            style,
            mark: None,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.text.len() == MARKER_CHAR.len_utf8() && self.text.starts_with(MARKER_CHAR)
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// An embedded image leaf.
///
/// `width`/`height` are the style-based size in device-independent units;
/// `None` means automatic. `attr_width`/`attr_height` hold legacy pixel
/// attributes seen at parse time until the constraint pass converts them to
/// style sizing and clears them. `handle` is the stable interaction id the
/// constraint pass assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNode {
    pub src: SmolStr,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub attr_width: Option<u32>,
    pub attr_height: Option<u32>,
    pub handle: Option<u32>,
}

impl ImageNode {
    pub fn new(src: impl Into<SmolStr>) -> Self {
        Self {
            src: src.into(),
            width: None,
            height: None,
            attr_width: None,
            attr_height: None,
            handle: None,
        }
    }
}

/// One inline content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Run(Run),
    Image(ImageNode),
}

impl Inline {
    /// Width of this item in inline offset units.
    pub fn len(&self) -> usize {
        match self {
            Inline::Run(run) => run.char_len(),
            Inline::Image(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_run(&self) -> Option<&Run> {
        match self {
            Inline::Run(run) => Some(run),
            Inline::Image(_) => None,
        }
    }

    pub fn as_run_mut(&mut self) -> Option<&mut Run> {
        match self {
            Inline::Run(run) => Some(run),
            Inline::Image(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

/// Kind of a text-bearing block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKind {
    Paragraph,
    /// Heading level, clamped to 1..=6 by normalization.
    Heading(u8),
    ListItem(ListKind),
}

impl TextKind {
    pub fn is_heading(&self) -> bool {
        matches!(self, TextKind::Heading(_))
    }
}

/// One table cell: a recursive block sequence, never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub blocks: Vec<Block>,
}

impl Cell {
    pub fn empty() -> Self {
        Self {
            blocks: vec![Block::paragraph()],
        }
    }
}

/// A rows x cols grid of cells, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    pub rows: usize,
    pub cols: usize,
    pub cells: Vec<Cell>,
}

impl TableGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: (0..rows * cols).map(|_| Cell::empty()).collect(),
        }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Cell> {
        if row < self.rows && col < self.cols {
            self.cells.get_mut(row * self.cols + col)
        } else {
            None
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

/// Payload of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockBody {
    Text { kind: TextKind, inlines: Vec<Inline> },
    Table(TableGrid),
    PageBreak,
}

/// One structural unit of the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub align: Alignment,
    pub indent: u8,
    pub body: BlockBody,
}

impl Block {
    /// An empty paragraph.
    pub fn paragraph() -> Self {
        Self::text(TextKind::Paragraph, Vec::new())
    }

    pub fn text(kind: TextKind, inlines: Vec<Inline>) -> Self {
        Self {
            align: Alignment::default(),
            indent: 0,
            body: BlockBody::Text { kind, inlines },
        }
    }

    pub fn table(grid: TableGrid) -> Self {
        Self {
            align: Alignment::default(),
            indent: 0,
            body: BlockBody::Table(grid),
        }
    }

    pub fn page_break() -> Self {
        Self {
            align: Alignment::default(),
            indent: 0,
            body: BlockBody::PageBreak,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.body, BlockBody::Text { .. })
    }

    pub fn text_kind(&self) -> Option<TextKind> {
        match &self.body {
            BlockBody::Text { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Replace the kind of a text block. Returns false for non-text blocks.
    pub fn set_text_kind(&mut self, new_kind: TextKind) -> bool {
        match &mut self.body {
            BlockBody::Text { kind, .. } => {
                *kind = new_kind;
                true
            }
            _ => false,
        }
    }

    pub fn inlines(&self) -> Option<&[Inline]> {
        match &self.body {
            BlockBody::Text { inlines, .. } => Some(inlines),
            _ => None,
        }
    }

    pub fn inlines_mut(&mut self) -> Option<&mut Vec<Inline>> {
        match &mut self.body {
            BlockBody::Text { inlines, .. } => Some(inlines),
            _ => None,
        }
    }

    /// Total inline length in offset units (marker runs included).
    pub fn inline_len(&self) -> usize {
        self.inlines()
            .map(|inlines| inlines.iter().map(Inline::len).sum())
            .unwrap_or(0)
    }

    /// Visible text of this block: run text only, marker runs and images
    /// excluded. Nested table content is not included.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        if let Some(inlines) = self.inlines() {
            for inline in inlines {
                if let Inline::Run(run) = inline {
                    if !run.is_marker() {
                        out.push_str(&run.text);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_lengths() {
        assert_eq!(Run::new("héllo").char_len(), 5);
        assert_eq!(Inline::Run(Run::new("ab")).len(), 2);
        assert_eq!(Inline::Image(ImageNode::new("a.png")).len(), 1);
    }

    #[test]
    fn test_marker_detection() {
        let marker = Run::marker(Style::default());
        assert!(marker.is_marker());
        assert_eq!(marker.char_len(), 1);
        assert!(!Run::new("x").is_marker());
        assert!(!Run::new("\u{200B}x").is_marker());
    }

    #[test]
    fn test_grid_addressing() {
        let grid = TableGrid::new(2, 3);
        assert_eq!(grid.cell_count(), 6);
        assert!(grid.cell(1, 2).is_some());
        assert!(grid.cell(2, 0).is_none());
        assert!(grid.cell(0, 3).is_none());
        assert_eq!(grid.cell(0, 0).map(|c| c.blocks.len()), Some(1));
    }

    #[test]
    fn test_block_plain_text_skips_markers_and_images() {
        let block = Block::text(
            TextKind::Paragraph,
            vec![
                Inline::Run(Run::new("a")),
                Inline::Run(Run::marker(Style::default())),
                Inline::Image(ImageNode::new("x.png")),
                Inline::Run(Run::new("b")),
            ],
        );
        assert_eq!(block.plain_text(), "ab");
        assert_eq!(block.inline_len(), 4);
    }
}
