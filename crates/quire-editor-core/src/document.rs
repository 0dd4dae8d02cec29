//! The document tree: an ordered block sequence with recursive table cells.
//!
//! Paths address blocks through arbitrarily nested cells. A path alternates
//! `Step::Block(index)` and `Step::Cell { row, col }` and always ends on a
//! `Step::Block`, so the last step names a block inside some sequence (the
//! top level or a cell).

use crate::node::{Block, BlockBody, Cell, ImageNode, TextKind};
use crate::selection::Position;

/// One step of a block path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Block(usize),
    Cell { row: usize, col: usize },
}

/// Address of a block in the tree. Ordered lexicographically, which matches
/// document order for positions inside the same sequence.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct BlockPath(pub Vec<Step>);

impl BlockPath {
    /// Path of a top-level block.
    pub fn root(index: usize) -> Self {
        BlockPath(vec![Step::Block(index)])
    }

    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Index of the addressed block within its containing sequence.
    pub fn leaf_index(&self) -> usize {
        match self.0.last() {
            Some(Step::Block(index)) => *index,
            _ => 0,
        }
    }

    pub fn with_leaf_index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        if let Some(last) = steps.last_mut() {
            *last = Step::Block(index);
        }
        BlockPath(steps)
    }

    /// Steps identifying the containing sequence (everything but the leaf).
    pub fn parent_steps(&self) -> &[Step] {
        &self.0[..self.0.len().saturating_sub(1)]
    }

    /// Whether two paths address blocks of the same sequence.
    pub fn same_sequence(&self, other: &BlockPath) -> bool {
        self.parent_steps() == other.parent_steps()
    }

    /// Extend this path into a cell of the addressed block.
    pub fn into_cell(&self, row: usize, col: usize, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(Step::Cell { row, col });
        steps.push(Step::Block(index));
        BlockPath(steps)
    }
}

/// The owned content tree. Always holds at least one block, and at least one
/// text block at the top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document holding a single empty paragraph.
    pub fn new() -> Self {
        Document {
            blocks: vec![Block::paragraph()],
        }
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut doc = Document { blocks };
        doc.normalize();
        doc
    }

    /// Resolve a path to a block.
    pub fn block(&self, path: &BlockPath) -> Option<&Block> {
        let mut sequence = &self.blocks;
        let mut current: Option<&Block> = None;
        for step in path.steps() {
            match step {
                Step::Block(index) => {
                    current = sequence.get(*index);
                    current?;
                }
                Step::Cell { row, col } => match &current?.body {
                    BlockBody::Table(grid) => {
                        sequence = &grid.cell(*row, *col)?.blocks;
                        current = None;
                    }
                    _ => return None,
                },
            }
        }
        current
    }

    pub fn block_mut(&mut self, path: &BlockPath) -> Option<&mut Block> {
        let sequence = self.sequence_mut(path.parent_steps())?;
        sequence.get_mut(path.leaf_index())
    }

    /// The block sequence identified by a parent-step prefix.
    pub fn sequence(&self, steps: &[Step]) -> Option<&Vec<Block>> {
        let mut sequence = &self.blocks;
        let mut pending: Option<&Block> = None;
        for step in steps {
            match step {
                Step::Block(index) => {
                    pending = Some(sequence.get(*index)?);
                }
                Step::Cell { row, col } => match &pending?.body {
                    BlockBody::Table(grid) => {
                        sequence = &grid.cell(*row, *col)?.blocks;
                        pending = None;
                    }
                    _ => return None,
                },
            }
        }
        Some(sequence)
    }

    pub fn sequence_mut(&mut self, steps: &[Step]) -> Option<&mut Vec<Block>> {
        let mut sequence = &mut self.blocks;
        let mut index_pending: Option<usize> = None;
        for step in steps {
            match step {
                Step::Block(index) => {
                    if *index >= sequence.len() {
                        return None;
                    }
                    index_pending = Some(*index);
                }
                Step::Cell { row, col } => {
                    let block = sequence.get_mut(index_pending?)?;
                    match &mut block.body {
                        BlockBody::Table(grid) => {
                            sequence = &mut grid.cell_mut(*row, *col)?.blocks;
                            index_pending = None;
                        }
                        _ => return None,
                    }
                }
            }
        }
        Some(sequence)
    }

    /// Plain-text projection: one line per text block in document order,
    /// descending through table cells; page breaks contribute an empty line.
    pub fn plain_text(&self) -> String {
        let mut lines = Vec::new();
        collect_lines(&self.blocks, &mut lines);
        lines.join("\n")
    }

    /// Path of the first text block, descending into tables if need be.
    pub fn first_text_path(&self) -> BlockPath {
        first_text_in(&self.blocks, Vec::new()).unwrap_or_else(|| BlockPath::root(0))
    }

    /// Clamp a position to a valid text-block position in this tree.
    pub fn clamp_position(&self, position: &Position) -> Position {
        if let Some(block) = self.block(&position.path) {
            if block.is_text() {
                return Position::new(
                    position.path.clone(),
                    position.offset.min(block.inline_len()),
                );
            }
            // Structural block: fall back to a nearby text block in the
            // same sequence, scanning forward then backward.
            if let Some(sequence) = self.sequence(position.path.parent_steps()) {
                let leaf = position.path.leaf_index();
                let forward = sequence[leaf..].iter().position(Block::is_text);
                let backward = sequence[..leaf].iter().rposition(Block::is_text);
                if let Some(found) = forward.map(|i| leaf + i).or(backward) {
                    let path = position.path.with_leaf_index(found);
                    let offset = if forward.is_some() {
                        0
                    } else {
                        sequence[found].inline_len()
                    };
                    return Position::new(path, offset);
                }
            }
        }
        Position::new(self.first_text_path(), 0)
    }

    /// Visit every image in the tree, including images inside table cells.
    pub fn for_each_image_mut(&mut self, visit: &mut impl FnMut(&mut ImageNode)) {
        for_each_image_in(&mut self.blocks, visit);
    }

    pub fn for_each_image(&self, visit: &mut impl FnMut(&ImageNode)) {
        for_each_image_ref(&self.blocks, visit);
    }

    /// Visit every text block in document order, including cell content.
    pub fn for_each_text_block_mut(&mut self, visit: &mut impl FnMut(&mut Block)) {
        for_each_text_in(&mut self.blocks, visit);
    }

    pub fn for_each_text_block(&self, visit: &mut impl FnMut(&Block)) {
        for_each_text_ref(&self.blocks, visit);
    }

    /// Path-aware variant of [`Self::for_each_text_block_mut`].
    pub fn for_each_text_block_path_mut(
        &mut self,
        visit: &mut impl FnMut(&BlockPath, &mut Block),
    ) {
        let mut base = Vec::new();
        for_each_text_path_in(&mut self.blocks, &mut base, visit);
    }

    /// Restore structural invariants: never-empty sequences, clamped heading
    /// levels, no zero-length runs, well-shaped table grids. Idempotent.
    pub fn normalize(&mut self) {
        normalize_blocks(&mut self.blocks);
        if self.blocks.is_empty() {
            self.blocks.push(Block::paragraph());
        }
        if !self.blocks.iter().any(Block::is_text) {
            self.blocks.push(Block::paragraph());
        }
    }
}

fn collect_lines(blocks: &[Block], lines: &mut Vec<String>) {
    for block in blocks {
        match &block.body {
            BlockBody::Text { .. } => lines.push(block.plain_text()),
            BlockBody::Table(grid) => {
                for cell in &grid.cells {
                    collect_lines(&cell.blocks, lines);
                }
            }
            BlockBody::PageBreak => lines.push(String::new()),
        }
    }
}

fn first_text_in(blocks: &[Block], base: Vec<Step>) -> Option<BlockPath> {
    for (index, block) in blocks.iter().enumerate() {
        match &block.body {
            BlockBody::Text { .. } => {
                let mut steps = base.clone();
                steps.push(Step::Block(index));
                return Some(BlockPath(steps));
            }
            BlockBody::Table(grid) => {
                for row in 0..grid.rows {
                    for col in 0..grid.cols {
                        if let Some(cell) = grid.cell(row, col) {
                            let mut steps = base.clone();
                            steps.push(Step::Block(index));
                            steps.push(Step::Cell { row, col });
                            if let Some(found) = first_text_in(&cell.blocks, steps) {
                                return Some(found);
                            }
                        }
                    }
                }
            }
            BlockBody::PageBreak => {}
        }
    }
    None
}

fn for_each_image_in(blocks: &mut [Block], visit: &mut impl FnMut(&mut ImageNode)) {
    for block in blocks {
        match &mut block.body {
            BlockBody::Text { inlines, .. } => {
                for inline in inlines {
                    if let crate::node::Inline::Image(image) = inline {
                        visit(image);
                    }
                }
            }
            BlockBody::Table(grid) => {
                for cell in &mut grid.cells {
                    for_each_image_in(&mut cell.blocks, visit);
                }
            }
            BlockBody::PageBreak => {}
        }
    }
}

fn for_each_image_ref(blocks: &[Block], visit: &mut impl FnMut(&ImageNode)) {
    for block in blocks {
        match &block.body {
            BlockBody::Text { inlines, .. } => {
                for inline in inlines {
                    if let crate::node::Inline::Image(image) = inline {
                        visit(image);
                    }
                }
            }
            BlockBody::Table(grid) => {
                for cell in &grid.cells {
                    for_each_image_ref(&cell.blocks, visit);
                }
            }
            BlockBody::PageBreak => {}
        }
    }
}

fn for_each_text_in(blocks: &mut [Block], visit: &mut impl FnMut(&mut Block)) {
    for block in blocks {
        match &mut block.body {
            BlockBody::Text { .. } => visit(block),
            BlockBody::Table(grid) => {
                for cell in &mut grid.cells {
                    for_each_text_in(&mut cell.blocks, visit);
                }
            }
            BlockBody::PageBreak => {}
        }
    }
}

fn for_each_text_ref(blocks: &[Block], visit: &mut impl FnMut(&Block)) {
    for block in blocks {
        match &block.body {
            BlockBody::Text { .. } => visit(block),
            BlockBody::Table(grid) => {
                for cell in &grid.cells {
                    for_each_text_ref(&cell.blocks, visit);
                }
            }
            BlockBody::PageBreak => {}
        }
    }
}

fn for_each_text_path_in(
    blocks: &mut [Block],
    base: &mut Vec<Step>,
    visit: &mut impl FnMut(&BlockPath, &mut Block),
) {
    for (index, block) in blocks.iter_mut().enumerate() {
        base.push(Step::Block(index));
        match &mut block.body {
            BlockBody::Text { .. } => {
                let path = BlockPath(base.clone());
                visit(&path, block);
            }
            BlockBody::Table(grid) => {
                let cols = grid.cols.max(1);
                for (cell_index, cell) in grid.cells.iter_mut().enumerate() {
                    base.push(Step::Cell {
                        row: cell_index / cols,
                        col: cell_index % cols,
                    });
                    for_each_text_path_in(&mut cell.blocks, base, visit);
                    base.pop();
                }
            }
            BlockBody::PageBreak => {}
        }
        base.pop();
    }
}

fn normalize_blocks(blocks: &mut Vec<Block>) {
    for block in blocks.iter_mut() {
        match &mut block.body {
            BlockBody::Text { kind, inlines } => {
                if let TextKind::Heading(level) = kind {
                    *level = (*level).clamp(1, 6);
                }
                inlines.retain(|inline| !inline.is_empty());
            }
            BlockBody::Table(grid) => {
                grid.rows = grid.rows.max(1);
                grid.cols = grid.cols.max(1);
                grid.cells.resize_with(grid.rows * grid.cols, Cell::empty);
                for cell in &mut grid.cells {
                    normalize_blocks(&mut cell.blocks);
                    if cell.blocks.is_empty() {
                        cell.blocks.push(Block::paragraph());
                    }
                    if !cell.blocks.iter().any(Block::is_text) {
                        cell.blocks.push(Block::paragraph());
                    }
                }
            }
            BlockBody::PageBreak => {}
        }
    }
}
