//! Numeric policy for the editing session.
//!
//! Every limit and layout constant the engine consults lives here, so a host
//! can deserialize a different policy without touching engine code. Defaults
//! match US Letter at 96dpi with the stock toolbar options.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Page geometry used by the pagination estimates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetrics {
    /// Height of one page in device-independent units (11in at 96dpi).
    pub page_height: u32,
    /// Plain-text lines counted per page by the line-count estimate.
    pub lines_per_page: usize,
}

impl Default for PageMetrics {
    fn default() -> Self {
        Self {
            page_height: 1056,
            lines_per_page: 40,
        }
    }
}

/// Deterministic per-block layout metrics feeding the content-extent
/// estimate. These are estimate inputs, not a layout engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutMetrics {
    pub line_height: u32,
    pub content_width: u32,
    /// Average glyph advance used to estimate soft wrapping.
    pub char_width: u32,
    /// Vertical spacing charged to every block.
    pub block_spacing: u32,
    pub table_row_height: u32,
    /// Height charged for an image with automatic height.
    pub image_default_height: u32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            line_height: 24,
            content_width: 720,
            char_width: 8,
            block_spacing: 10,
            table_row_height: 37,
            image_default_height: 240,
        }
    }
}

/// Bounds on structural insertion and embedded image size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertLimits {
    pub max_table_rows: usize,
    pub max_table_cols: usize,
    pub min_image_size: u32,
    pub max_image_width: u32,
    pub max_image_height: u32,
}

impl Default for InsertLimits {
    fn default() -> Self {
        Self {
            max_table_rows: 20,
            max_table_cols: 10,
            min_image_size: 32,
            max_image_width: 720,
            max_image_height: 880,
        }
    }
}

/// Font allow-list and size bounds offered by the formatting surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontPolicy {
    pub families: Vec<SmolStr>,
    pub min_size: u8,
    pub max_size: u8,
    pub default_size: u8,
}

impl Default for FontPolicy {
    fn default() -> Self {
        Self {
            families: [
                "Arial",
                "Calibri",
                "Times New Roman",
                "Georgia",
                "Verdana",
                "Courier New",
            ]
            .into_iter()
            .map(SmolStr::new)
            .collect(),
            min_size: 8,
            max_size: 48,
            default_size: 16,
        }
    }
}

impl FontPolicy {
    pub fn allows_family(&self, family: &str) -> bool {
        self.families.iter().any(|f| f == family)
    }

    pub fn allows_size(&self, size: u8) -> bool {
        (self.min_size..=self.max_size).contains(&size)
    }
}

/// Aggregate session policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub page: PageMetrics,
    pub layout: LayoutMetrics,
    pub limits: InsertLimits,
    pub fonts: FontPolicy,
    /// Idle window after the last change before an auto-save is due.
    pub autosave_interval_secs: u64,
    pub max_indent: u8,
    /// Undo stack depth; oldest snapshots drop past this.
    pub history_depth: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            page: PageMetrics::default(),
            layout: LayoutMetrics::default(),
            limits: InsertLimits::default(),
            fonts: FontPolicy::default(),
            autosave_interval_secs: 30,
            max_indent: 8,
            history_depth: 100,
        }
    }
}

impl EditorConfig {
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.page.page_height, 1056);
        assert_eq!(config.page.lines_per_page, 40);
        assert_eq!(config.limits.max_table_rows, 20);
        assert_eq!(config.limits.max_table_cols, 10);
        assert_eq!(config.autosave_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_font_policy() {
        let fonts = FontPolicy::default();
        assert!(fonts.allows_family("Georgia"));
        assert!(!fonts.allows_family("Comic Sans MS"));
        assert!(fonts.allows_size(16));
        assert!(!fonts.allows_size(72));
    }
}
