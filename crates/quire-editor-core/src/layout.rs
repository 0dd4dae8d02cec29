//! Pagination estimates and status-bar content metrics.
//!
//! Two page signals are kept deliberately separate: a cheap line count over
//! the plain-text projection, and a content-extent estimate from a
//! deterministic layout model. They measure different things and are
//! allowed to disagree.

use crate::config::{LayoutMetrics, PageMetrics};
use crate::document::Document;
use crate::node::{Block, BlockBody, Inline};

/// Derived, display-only numbers. Recomputed wholesale after every
/// mutation, never stored in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentMetrics {
    pub words: usize,
    pub chars: usize,
    pub lines: usize,
    pub rendered_height: usize,
    pub pages_by_lines: usize,
    pub pages_by_extent: usize,
}

impl Default for ContentMetrics {
    fn default() -> Self {
        ContentMetrics {
            words: 0,
            chars: 0,
            lines: 1,
            rendered_height: 0,
            pages_by_lines: 1,
            pages_by_extent: 1,
        }
    }
}

pub fn measure(doc: &Document, page: &PageMetrics, layout: &LayoutMetrics) -> ContentMetrics {
    let plain = doc.plain_text();
    let lines = plain.split('\n').count();
    let words = plain.split_whitespace().count();
    // Block separators are a projection artifact, not content.
    let chars = plain.chars().filter(|c| *c != '\n').count();

    let page_height = (page.page_height as usize).max(1);
    let mut height = 0usize;
    for block in &doc.blocks {
        match &block.body {
            BlockBody::PageBreak => {
                height += (page_height - height % page_height) % page_height;
            }
            _ => height += block_height(block, layout) + layout.block_spacing as usize,
        }
    }

    ContentMetrics {
        words,
        chars,
        lines,
        rendered_height: height,
        pages_by_lines: lines.div_ceil(page.lines_per_page as usize).max(1),
        pages_by_extent: height.div_ceil(page_height).max(1),
    }
}

fn block_height(block: &Block, layout: &LayoutMetrics) -> usize {
    match &block.body {
        BlockBody::Text { inlines, .. } => {
            let chars = block.plain_text().chars().count();
            let line_width = (layout.content_width as usize).max(1);
            let wrapped = (chars * layout.char_width as usize).div_ceil(line_width).max(1);
            let mut height = wrapped * layout.line_height as usize;
            for inline in inlines {
                if let Inline::Image(image) = inline {
                    height += image.height.unwrap_or(layout.image_default_height) as usize;
                }
            }
            height
        }
        BlockBody::Table(grid) => {
            let mut height = 0;
            for row in 0..grid.rows {
                let mut row_height = layout.table_row_height as usize;
                for col in 0..grid.cols {
                    if let Some(cell) = grid.cell(row, col) {
                        let content = cell
                            .blocks
                            .iter()
                            .map(|b| block_height(b, layout) + layout.block_spacing as usize)
                            .sum();
                        row_height = row_height.max(content);
                    }
                }
                height += row_height;
            }
            height
        }
        BlockBody::PageBreak => layout.line_height as usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ImageNode, Run, TableGrid, TextKind};

    fn para(text: &str) -> Block {
        Block::text(TextKind::Paragraph, vec![Inline::Run(Run::new(text))])
    }

    fn measure_doc(doc: &Document) -> ContentMetrics {
        measure(doc, &PageMetrics::default(), &LayoutMetrics::default())
    }

    #[test]
    fn test_empty_document_is_one_page() {
        let metrics = measure_doc(&Document::new());
        assert_eq!(metrics.lines, 1);
        assert_eq!(metrics.words, 0);
        assert_eq!(metrics.chars, 0);
        assert_eq!(metrics.pages_by_lines, 1);
        assert_eq!(metrics.pages_by_extent, 1);
    }

    #[test]
    fn test_line_count_page_boundary() {
        let doc = Document::from_blocks((0..40).map(|_| para("line")).collect());
        assert_eq!(measure_doc(&doc).lines, 40);
        assert_eq!(measure_doc(&doc).pages_by_lines, 1);

        let doc = Document::from_blocks((0..41).map(|_| para("line")).collect());
        assert_eq!(measure_doc(&doc).pages_by_lines, 2);
    }

    #[test]
    fn test_word_and_char_counts() {
        let doc = Document::from_blocks(vec![para("Teh cat sat"), para("  spaced   out ")]);
        let metrics = measure_doc(&doc);
        assert_eq!(metrics.words, 5);
        assert_eq!(metrics.chars, 11 + 15);
        assert_eq!(metrics.lines, 2);
    }

    #[test]
    fn test_long_text_wraps_onto_second_page() {
        let doc = Document::from_blocks(vec![para(&"x".repeat(4000))]);
        let metrics = measure_doc(&doc);
        // 4000 chars at 8 units wrap to 45 lines of 24 units.
        assert_eq!(metrics.rendered_height, 45 * 24 + 10);
        assert_eq!(metrics.pages_by_extent, 2);
        assert_eq!(metrics.pages_by_lines, 1);
    }

    #[test]
    fn test_page_break_pads_to_next_boundary() {
        let doc = Document::from_blocks(vec![para("a"), Block::page_break(), para("b")]);
        let metrics = measure_doc(&doc);
        assert_eq!(metrics.rendered_height, 1056 + 34);
        assert_eq!(metrics.pages_by_extent, 2);
    }

    #[test]
    fn test_signals_may_disagree() {
        let doc = Document::from_blocks((0..40).map(|_| para("line")).collect());
        let metrics = measure_doc(&doc);
        assert_eq!(metrics.pages_by_lines, 1);
        // 40 blocks of 34 units exceed one 1056-unit page.
        assert_eq!(metrics.pages_by_extent, 2);
    }

    #[test]
    fn test_table_row_uses_tallest_cell() {
        let mut grid = TableGrid::new(1, 2);
        grid.cell_mut(0, 1).unwrap().blocks = vec![para("a"), para("b"), para("c")];
        let doc = Document::from_blocks(vec![Block::table(grid)]);
        let metrics = measure_doc(&doc);
        // Three stacked paragraphs beat the 37-unit row minimum.
        assert_eq!(metrics.rendered_height, 3 * 34 + 10);
    }

    #[test]
    fn test_image_contributes_height() {
        let mut sized = ImageNode::new("pic.png");
        sized.height = Some(100);
        let doc = Document::from_blocks(vec![Block::text(
            TextKind::Paragraph,
            vec![Inline::Image(sized), Inline::Image(ImageNode::new("auto.png"))],
        )]);
        let metrics = measure_doc(&doc);
        assert_eq!(metrics.rendered_height, 24 + 100 + 240 + 10);
    }
}
