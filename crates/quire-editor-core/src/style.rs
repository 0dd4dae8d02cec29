//! Inline style values and block-level presentation attributes.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The four boolean inline styles a toggle command can flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// Block text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_css(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    pub fn from_css(value: &str) -> Option<Self> {
        match value.trim() {
            "left" => Some(Alignment::Left),
            "center" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" => Some(Alignment::Justify),
            _ => None,
        }
    }
}

/// The full style of one inline run.
///
/// `None` for an optional attribute means "inherit the surface default";
/// the serializer omits it entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub font_family: Option<SmolStr>,
    /// Size in device-independent units (px at 96dpi).
    pub font_size: Option<u8>,
    pub color: Option<SmolStr>,
    pub highlight: Option<SmolStr>,
}

impl Style {
    pub fn is_plain(&self) -> bool {
        *self == Style::default()
    }

    pub fn flag(&self, kind: StyleKind) -> bool {
        match kind {
            StyleKind::Bold => self.bold,
            StyleKind::Italic => self.italic,
            StyleKind::Underline => self.underline,
            StyleKind::Strikethrough => self.strikethrough,
        }
    }

    pub fn set_flag(&mut self, kind: StyleKind, on: bool) {
        match kind {
            StyleKind::Bold => self.bold = on,
            StyleKind::Italic => self.italic = on,
            StyleKind::Underline => self.underline = on,
            StyleKind::Strikethrough => self.strikethrough = on,
        }
    }

    pub fn toggle(&mut self, kind: StyleKind) {
        self.set_flag(kind, !self.flag(kind));
    }

    /// True when any of the span-serialized attributes is set.
    pub fn has_span_attrs(&self) -> bool {
        self.font_family.is_some()
            || self.font_size.is_some()
            || self.color.is_some()
            || self.highlight.is_some()
    }
}

/// Case transform applied to text when a block is promoted to a heading.
///
/// Level 1 uppercases everything, level 2 capitalizes only the first
/// character and lowercases the rest, deeper levels leave text alone. The
/// transform is one-way; demoting a heading never restores casing.
pub fn heading_case(level: u8, text: &str) -> String {
    match level {
        1 => text.to_uppercase(),
        2 => {
            let mut chars = text.chars();
            match chars.next() {
                Some(first) => {
                    let mut out = String::with_capacity(text.len());
                    out.extend(first.to_uppercase());
                    out.push_str(&chars.as_str().to_lowercase());
                    out
                }
                None => String::new(),
            }
        }
        _ => text.to_owned(),
    }
}
