//! Payload types crossing the collaborator boundary.
//!
//! Everything here is a plain serde value: the engine produces or consumes
//! these, the embedding shell moves them over whatever transport it owns.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity returned by [`crate::DocumentStore::create`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHead {
    pub id: SmolStr,
    pub title: SmolStr,
}

/// Full persisted record as returned by [`crate::DocumentStore::get`].
///
/// `content` is the serialized document markup and is opaque to the store.
/// Timestamps are assigned by the store and opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: SmolStr,
    pub title: SmolStr,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<SmolStr>,
    #[serde(default)]
    pub updated_at: Option<SmolStr>,
}

/// One misspelled word reported by the spell checker.
///
/// `position` is a char offset into the checked plain text; it names the
/// occurrence the checker saw first, not every occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellingError {
    pub word: SmolStr,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
}

/// Result of a spell-check pass over a plain-text projection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellCheckReport {
    pub errors: Vec<SpellingError>,
    #[serde(default)]
    pub suggestions: BTreeMap<SmolStr, Vec<SmolStr>>,
}

/// One grammar finding. Carries no tree anchor; display-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarIssue {
    pub kind: SmolStr,
    pub message: String,
    #[serde(default)]
    pub position: Option<usize>,
    #[serde(default)]
    pub page: Option<usize>,
}

/// Result of a grammar-check pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarReport {
    pub errors: Vec<GrammarIssue>,
}

/// Target format for a document export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

/// Location of a finished export on whatever storage the exporter uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub path: String,
}

/// Reachability signal from the backing services. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Fail,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, HealthStatus::Ok)
    }
}
