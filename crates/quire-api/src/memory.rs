//! In-memory collaborator implementations.
//!
//! Deterministic doubles for tests and offline runs: a map-backed store with
//! revision-counter timestamps, a fixed-dictionary checker, and a no-op
//! exporter. No transport, no clock.

use std::collections::{BTreeMap, BTreeSet};

use smol_str::{SmolStr, ToSmolStr, format_smolstr};

use crate::error::ServiceError;
use crate::service::{DocumentStore, ExportService, HealthCheck, LanguageService};
use crate::types::{
    DocumentHead, ExportFormat, ExportedFile, GrammarReport, HealthStatus, SpellCheckReport,
    SpellingError, StoredDocument,
};

#[derive(Debug, Clone)]
struct StoredRecord {
    title: SmolStr,
    content: String,
    created_at: SmolStr,
    updated_at: SmolStr,
}

/// Map-backed [`DocumentStore`].
///
/// Timestamps are revision strings (`rev-1`, `rev-2`, ...) since this store
/// has no wall clock. `fail_auto_saves` makes every `auto_save` call report
/// the backend as unreachable, for exercising the retry path.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: BTreeMap<SmolStr, StoredRecord>,
    next_id: u64,
    next_rev: u64,
    pub fail_auto_saves: bool,
    pub auto_save_calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_rev(&mut self) -> SmolStr {
        self.next_rev += 1;
        format_smolstr!("rev-{}", self.next_rev)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl DocumentStore for MemoryStore {
    fn create(&mut self, title: &str, content: &str) -> Result<DocumentHead, ServiceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::invalid("document title must not be empty"));
        }
        self.next_id += 1;
        let id = format_smolstr!("doc-{}", self.next_id);
        let rev = self.next_rev();
        self.docs.insert(
            id.clone(),
            StoredRecord {
                title: title.to_smolstr(),
                content: content.to_owned(),
                created_at: rev.clone(),
                updated_at: rev,
            },
        );
        Ok(DocumentHead {
            id,
            title: title.to_smolstr(),
        })
    }

    fn get(&self, id: &str) -> Result<StoredDocument, ServiceError> {
        let record = self.docs.get(id).ok_or_else(|| ServiceError::NotFound {
            id: id.to_smolstr(),
        })?;
        Ok(StoredDocument {
            id: id.to_smolstr(),
            title: record.title.clone(),
            content: record.content.clone(),
            created_at: Some(record.created_at.clone()),
            updated_at: Some(record.updated_at.clone()),
        })
    }

    fn update(&mut self, id: &str, title: &str, content: &str) -> Result<(), ServiceError> {
        let rev = self.next_rev();
        let record = self.docs.get_mut(id).ok_or_else(|| ServiceError::NotFound {
            id: id.to_smolstr(),
        })?;
        record.title = title.to_smolstr();
        record.content = content.to_owned();
        record.updated_at = rev;
        Ok(())
    }

    fn auto_save(&mut self, id: &str, content: &str) -> Result<(), ServiceError> {
        self.auto_save_calls += 1;
        if self.fail_auto_saves {
            return Err(ServiceError::unavailable("simulated auto-save outage"));
        }
        let rev = self.next_rev();
        let record = self.docs.get_mut(id).ok_or_else(|| ServiceError::NotFound {
            id: id.to_smolstr(),
        })?;
        record.content = content.to_owned();
        record.updated_at = rev;
        Ok(())
    }
}

impl HealthCheck for MemoryStore {
    fn check_health(&self) -> HealthStatus {
        HealthStatus::Ok
    }
}

/// Fixed-dictionary [`LanguageService`].
///
/// Flags every word absent from the dictionary (case-insensitive) and offers
/// the configured suggestions. Grammar checking always comes back clean.
#[derive(Debug, Default)]
pub struct WordListChecker {
    dictionary: BTreeSet<SmolStr>,
    suggestions: BTreeMap<SmolStr, Vec<SmolStr>>,
}

impl WordListChecker {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            dictionary: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase().to_smolstr())
                .collect(),
            suggestions: BTreeMap::new(),
        }
    }

    pub fn with_suggestion(mut self, word: &str, options: &[&str]) -> Self {
        self.suggestions.insert(
            word.to_lowercase().to_smolstr(),
            options.iter().map(|s| s.to_smolstr()).collect(),
        );
        self
    }

    fn is_known(&self, word: &str) -> bool {
        self.dictionary.contains(word.to_lowercase().as_str())
    }
}

impl LanguageService for WordListChecker {
    fn spell_check(&mut self, content: &str) -> Result<SpellCheckReport, ServiceError> {
        let mut report = SpellCheckReport::default();
        let mut seen = BTreeSet::new();
        let mut position = 0usize;

        for token in content.split(|c: char| !(c.is_alphanumeric() || c == '\'')) {
            if !token.is_empty() && !self.is_known(token) {
                let lower = token.to_lowercase().to_smolstr();
                if seen.insert(lower.clone()) {
                    report.errors.push(SpellingError {
                        word: token.to_smolstr(),
                        position: Some(position),
                        page: None,
                    });
                    if let Some(options) = self.suggestions.get(&lower) {
                        report
                            .suggestions
                            .insert(token.to_smolstr(), options.clone());
                    }
                }
            }
            position += token.chars().count() + 1;
        }
        Ok(report)
    }

    fn grammar_check(&mut self, _content: &str) -> Result<GrammarReport, ServiceError> {
        Ok(GrammarReport::default())
    }
}

/// [`ExportService`] that pretends every export landed next to the store.
#[derive(Debug, Default)]
pub struct MemoryExporter {
    pub exported: Vec<(SmolStr, ExportFormat)>,
}

impl ExportService for MemoryExporter {
    fn export(&mut self, id: &str, format: ExportFormat) -> Result<ExportedFile, ServiceError> {
        self.exported.push((id.to_smolstr(), format));
        Ok(ExportedFile {
            path: format!("exports/{}.{}", id, format.extension()),
        })
    }
}
