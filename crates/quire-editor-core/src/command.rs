//! Typed commands accepted by the editing session.
//!
//! Toolbar and panel callers build one of these payloads and hand it to
//! [`crate::session::EditorSession::dispatch`]. There is no other mutation
//! entry point.

use smol_str::SmolStr;

use crate::node::ListKind;
use crate::selection::Selection;
use crate::style::{Alignment, StyleKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Flip one inline style flag over the selection.
    ToggleInlineStyle(StyleKind),
    SetFontFamily(SmolStr),
    SetFontSize(u8),
    SetTextColor(SmolStr),
    SetHighlight(SmolStr),
    SetAlignment(Alignment),
    ToggleList(ListKind),
    Indent,
    Outdent,
    /// Promote the caret block to a heading, or demote it back to a
    /// paragraph if it already is one.
    ToggleHeading(u8),
    InsertText(String),
    /// Split the caret block in two, as typing Enter does.
    InsertParagraph,
    DeleteBackward,
    DeleteForward,
    InsertTable { rows: usize, cols: usize },
    InsertImage { src: SmolStr },
    InsertPageBreak,
    /// Move the caret or extend the selection.
    Select(Selection),
    Undo,
    Redo,
    /// Replace every marked occurrence of a flagged word.
    ApplySuggestion { word: SmolStr, suggestion: SmolStr },
    /// Clear the marks for one flagged word.
    IgnoreError { word: SmolStr },
    /// Clear the marks and suppress the word for the rest of the session.
    IgnoreAll { word: SmolStr },
}

impl Command {
    /// Stable name used in log events.
    pub fn name(&self) -> &'static str {
        match self {
            Command::ToggleInlineStyle(_) => "toggle_inline_style",
            Command::SetFontFamily(_) => "set_font_family",
            Command::SetFontSize(_) => "set_font_size",
            Command::SetTextColor(_) => "set_text_color",
            Command::SetHighlight(_) => "set_highlight",
            Command::SetAlignment(_) => "set_alignment",
            Command::ToggleList(_) => "toggle_list",
            Command::Indent => "indent",
            Command::Outdent => "outdent",
            Command::ToggleHeading(_) => "toggle_heading",
            Command::InsertText(_) => "insert_text",
            Command::InsertParagraph => "insert_paragraph",
            Command::DeleteBackward => "delete_backward",
            Command::DeleteForward => "delete_forward",
            Command::InsertTable { .. } => "insert_table",
            Command::InsertImage { .. } => "insert_image",
            Command::InsertPageBreak => "insert_page_break",
            Command::Select(_) => "select",
            Command::Undo => "undo",
            Command::Redo => "redo",
            Command::ApplySuggestion { .. } => "apply_suggestion",
            Command::IgnoreError { .. } => "ignore_error",
            Command::IgnoreAll { .. } => "ignore_all",
        }
    }

    /// Whether the command can change document content, as opposed to only
    /// selection or derived state. Used to decide history snapshots.
    pub fn is_edit(&self) -> bool {
        !matches!(self, Command::Select(_) | Command::Undo | Command::Redo)
    }
}
