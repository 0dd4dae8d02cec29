//! Error types for the document engine.

use miette::{Diagnostic, NamedSource, SourceSpan};
use smol_str::SmolStr;

/// Main error type for session operations.
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditError {
    /// Table dimensions outside the configured range
    #[error("table size {rows}x{cols} is outside the allowed range")]
    #[diagnostic(
        code(quire::edit::table_size),
        help("rows must be within 1..={max_rows} and columns within 1..={max_cols}")
    )]
    TableSize {
        rows: usize,
        cols: usize,
        max_rows: usize,
        max_cols: usize,
    },

    /// Font family not offered by the editor configuration
    #[error("font family {family:?} is not offered by the editor")]
    #[diagnostic(code(quire::edit::font_family))]
    UnknownFontFamily { family: SmolStr },

    /// Font size outside the configured bounds
    #[error("font size {size} is outside {min}..={max}")]
    #[diagnostic(code(quire::edit::font_size))]
    FontSizeOutOfRange { size: u8, min: u8, max: u8 },

    /// Markup parse error with source location
    #[error(transparent)]
    #[diagnostic_source]
    Markup(#[from] MarkupError),

    /// Collaborator service error
    #[error(transparent)]
    #[diagnostic_source]
    Service(#[from] quire_api::ServiceError),
}

/// Markup parse error carrying the offending source and span.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[error("markup error: {}", self.kind)]
#[diagnostic(code(quire::markup))]
pub struct MarkupError {
    #[diagnostic_source]
    kind: MarkupErrorKind,
    #[source_code]
    src: NamedSource<String>,
    #[label("here")]
    err_location: SourceSpan,
    #[help]
    advice: Option<String>,
}

impl MarkupError {
    pub(crate) fn new(kind: MarkupErrorKind, src: &str, offset: usize, len: usize) -> Self {
        let advice = kind.advice();
        Self {
            kind,
            src: NamedSource::new("document", src.to_owned()),
            err_location: SourceSpan::new(offset.into(), len),
            advice,
        }
    }

    pub fn kind(&self) -> &MarkupErrorKind {
        &self.kind
    }

    pub fn location(&self) -> SourceSpan {
        self.err_location
    }
}

#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum MarkupErrorKind {
    #[error("unexpected end of input inside <{tag}>")]
    UnexpectedEof { tag: SmolStr },
    #[error("closing tag </{found}> does not match open <{expected}>")]
    MismatchedClose { expected: SmolStr, found: SmolStr },
    #[error("malformed tag syntax")]
    MalformedTag,
    #[error("table cell content outside a row")]
    StrayCell,
}

impl MarkupErrorKind {
    fn advice(&self) -> Option<String> {
        match self {
            MarkupErrorKind::UnexpectedEof { tag } => {
                Some(format!("add a closing </{tag}> before the end of the document"))
            }
            MarkupErrorKind::MismatchedClose { expected, .. } => {
                Some(format!("close the inner <{expected}> element first"))
            }
            MarkupErrorKind::MalformedTag | MarkupErrorKind::StrayCell => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size_message() {
        let err = EditError::TableSize {
            rows: 0,
            cols: 21,
            max_rows: 20,
            max_cols: 10,
        };
        assert_eq!(err.to_string(), "table size 0x21 is outside the allowed range");
    }

    #[test]
    fn test_markup_error_carries_span() {
        let err = MarkupError::new(
            MarkupErrorKind::UnexpectedEof { tag: "strong".into() },
            "<p><strong>hi",
            3,
            8,
        );
        assert_eq!(err.to_string(), "markup error: unexpected end of input inside <strong>");
        assert_eq!(err.location().offset(), 3);
        assert_eq!(err.location().len(), 8);
    }
}
