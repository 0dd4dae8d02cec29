//! quire-editor-core: the document engine behind the editing surface.
//!
//! This crate provides:
//! - the block/inline document tree and tree-addressed selections
//! - pure editing, formatting, and structural-insert operations
//! - the persisted markup dialect (writer and strict parser)
//! - spell-highlight bookkeeping and pagination estimates
//! - `EditorSession` - the command dispatcher tying it all together

pub mod autosave;
pub mod command;
pub mod config;
pub mod document;
pub mod edit;
pub mod enforce;
pub mod error;
pub mod format;
pub mod history;
pub mod insert;
pub mod layout;
pub mod markup;
pub mod node;
pub mod selection;
pub mod session;
pub mod spelling;
pub mod style;

pub use autosave::AutosavePolicy;
pub use command::Command;
pub use config::{EditorConfig, FontPolicy, InsertLimits, LayoutMetrics, PageMetrics};
pub use document::{BlockPath, Document, Step};
pub use enforce::{HandleAllocator, enforce_constraints};
pub use error::{EditError, MarkupError, MarkupErrorKind};
pub use format::StyleChange;
pub use history::{EditHistory, Snapshot};
pub use layout::{ContentMetrics, measure};
pub use markup::{parse, serialize};
pub use node::{
    Block, BlockBody, Cell, ImageNode, Inline, ListKind, MARKER_CHAR, Run, TableGrid, TextKind,
};
pub use selection::{Position, Selection};
pub use session::EditorSession;
pub use smol_str::SmolStr;
pub use style::{Alignment, Style, StyleKind};
