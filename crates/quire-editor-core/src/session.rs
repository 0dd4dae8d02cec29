//! The editing session: one mutable surface over a document.
//!
//! Every content mutation enters through [`EditorSession::dispatch`], which
//! snapshots state for undo, runs the operation, prunes stale style markers,
//! enforces image constraints, and refreshes the derived metrics. Lifecycle
//! calls (`open`, `save`, `autosave_tick`, the check methods) talk to the
//! collaborator traits from `quire_api`; the session itself never owns a
//! timer or a transport.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;

use smol_str::SmolStr;
use web_time::Instant;

use quire_api::{
    DocumentStore, ExportFormat, ExportService, ExportedFile, GrammarReport, LanguageService,
    ServiceError, SpellCheckReport, SpellingError,
};

use crate::autosave::AutosavePolicy;
use crate::command::Command;
use crate::config::EditorConfig;
use crate::document::Document;
use crate::edit::{delete_backward, delete_forward, insert_paragraph, insert_text};
use crate::enforce::{HandleAllocator, enforce_constraints};
use crate::error::EditError;
use crate::format::{
    StyleChange, apply_style, caret_style, change_indent, prune_markers, set_alignment,
    toggle_heading, toggle_list,
};
use crate::history::{EditHistory, Snapshot};
use crate::insert::{insert_image, insert_page_break, insert_table};
use crate::layout::{ContentMetrics, measure};
use crate::markup::{parse, serialize};
use crate::selection::{Position, Selection};
use crate::spelling::{apply_suggestion, clear_marks, mark_errors, marked_words, sweep_marks};
use crate::style::Style;

const DEFAULT_TITLE: &str = "Untitled document";

pub struct EditorSession {
    doc: Document,
    selection: Selection,
    config: EditorConfig,
    history: EditHistory,
    handles: HandleAllocator,
    autosave: AutosavePolicy,
    errors: SpellCheckReport,
    grammar: GrammarReport,
    /// Words suppressed for the rest of the session, lowercased.
    ignored: BTreeSet<SmolStr>,
    doc_id: Option<SmolStr>,
    title: SmolStr,
    dirty: bool,
    metrics: ContentMetrics,
    /// Bumped on every content change; lets a finished check detect that it
    /// ran against stale text.
    edit_seq: u64,
    check_seq: u64,
    check_in_flight: bool,
    recheck_requested: bool,
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        let doc = Document::new();
        let selection = Selection::caret(Position::new(doc.first_text_path(), 0));
        let metrics = measure(&doc, &config.page, &config.layout);
        let history = EditHistory::new(config.history_depth);
        let autosave = AutosavePolicy::new(config.autosave_interval());
        Self {
            doc,
            selection,
            history,
            handles: HandleAllocator::default(),
            autosave,
            errors: SpellCheckReport::default(),
            grammar: GrammarReport::default(),
            ignored: BTreeSet::new(),
            doc_id: None,
            title: SmolStr::new(DEFAULT_TITLE),
            dirty: false,
            metrics,
            edit_seq: 0,
            check_seq: 0,
            check_in_flight: false,
            recheck_requested: false,
            config,
        }
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ContentMetrics {
        &self.metrics
    }

    pub fn errors(&self) -> &SpellCheckReport {
        &self.errors
    }

    pub fn grammar(&self) -> &GrammarReport {
        &self.grammar
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn document_id(&self) -> Option<&str> {
        self.doc_id.as_deref()
    }

    /// Unsaved changes since the last successful save or auto-save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_checking(&self) -> bool {
        self.check_in_flight
    }

    pub fn set_title(&mut self, title: impl Into<SmolStr>) {
        let title = title.into();
        if title != self.title {
            self.title = title;
            self.dirty = true;
        }
    }

    /// The style continued typing at the caret would produce. Feeds the
    /// toolbar's pressed/released state.
    pub fn style_at_caret(&self) -> Style {
        let position = self.doc.clamp_position(&self.selection.focus);
        match self.doc.block(&position.path) {
            Some(block) => caret_style(block, position.offset),
            None => Style::default(),
        }
    }

    /// Replacement candidates the last check offered for a flagged word.
    pub fn suggestions_for(&self, word: &str) -> &[SmolStr] {
        self.errors
            .suggestions
            .get(word)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Run one command against the session.
    ///
    /// Commands that end up changing nothing leave no history entry, so a
    /// backspace at the start of the document stays invisible to undo.
    pub fn dispatch(&mut self, command: Command) -> Result<(), EditError> {
        tracing::debug!(target: "quire::session", command = command.name(), "dispatch");
        match command {
            Command::Select(selection) => {
                self.selection = selection.clamped(&self.doc);
                prune_markers(&mut self.doc, &mut self.selection);
                return Ok(());
            }
            Command::Undo => {
                let current = self.snapshot();
                if let Some(restored) = self.history.undo(current) {
                    self.restore(restored);
                }
                return Ok(());
            }
            Command::Redo => {
                let current = self.snapshot();
                if let Some(restored) = self.history.redo(current) {
                    self.restore(restored);
                }
                return Ok(());
            }
            _ => {}
        }

        self.validate(&command)?;
        let before = self.snapshot();
        let Some(next) = self.apply_edit(&command)? else {
            return Ok(());
        };
        self.selection = next;
        prune_markers(&mut self.doc, &mut self.selection);
        enforce_constraints(&mut self.doc, &self.config.limits, &mut self.handles);
        if self.doc == before.doc && self.errors == before.errors {
            return Ok(());
        }
        self.history.record(before);
        self.touch();
        Ok(())
    }

    fn validate(&self, command: &Command) -> Result<(), EditError> {
        match command {
            Command::SetFontFamily(family) => {
                if self.config.fonts.allows_family(family) {
                    Ok(())
                } else {
                    Err(EditError::UnknownFontFamily {
                        family: family.clone(),
                    })
                }
            }
            Command::SetFontSize(size) => {
                if self.config.fonts.allows_size(*size) {
                    Ok(())
                } else {
                    Err(EditError::FontSizeOutOfRange {
                        size: *size,
                        min: self.config.fonts.min_size,
                        max: self.config.fonts.max_size,
                    })
                }
            }
            _ => Ok(()),
        }
    }

    /// Run the content mutation for `command`. Returns the selection to
    /// adopt, or `None` for commands that produce no edit.
    fn apply_edit(&mut self, command: &Command) -> Result<Option<Selection>, EditError> {
        let selection = self.selection.clone();
        let next = match command {
            Command::ToggleInlineStyle(kind) => {
                apply_style(&mut self.doc, &selection, &StyleChange::Toggle(*kind))
            }
            Command::SetFontFamily(family) => apply_style(
                &mut self.doc,
                &selection,
                &StyleChange::FontFamily(family.clone()),
            ),
            Command::SetFontSize(size) => {
                apply_style(&mut self.doc, &selection, &StyleChange::FontSize(*size))
            }
            Command::SetTextColor(color) => apply_style(
                &mut self.doc,
                &selection,
                &StyleChange::TextColor(color.clone()),
            ),
            Command::SetHighlight(color) => apply_style(
                &mut self.doc,
                &selection,
                &StyleChange::Highlight(color.clone()),
            ),
            Command::SetAlignment(align) => set_alignment(&mut self.doc, &selection, *align),
            Command::ToggleList(kind) => toggle_list(&mut self.doc, &selection, *kind),
            Command::Indent => {
                change_indent(&mut self.doc, &selection, 1, self.config.max_indent)
            }
            Command::Outdent => {
                change_indent(&mut self.doc, &selection, -1, self.config.max_indent)
            }
            Command::ToggleHeading(level) => toggle_heading(&mut self.doc, &selection, *level),
            Command::InsertText(text) => insert_text(&mut self.doc, &selection, text),
            Command::InsertParagraph => insert_paragraph(&mut self.doc, &selection),
            Command::DeleteBackward => delete_backward(&mut self.doc, &selection),
            Command::DeleteForward => delete_forward(&mut self.doc, &selection),
            Command::InsertTable { rows, cols } => {
                insert_table(&mut self.doc, &selection, *rows, *cols, &self.config.limits)?
            }
            Command::InsertImage { src } => {
                if src.is_empty() {
                    return Ok(None);
                }
                insert_image(&mut self.doc, &selection, src)
            }
            Command::InsertPageBreak => insert_page_break(&mut self.doc, &selection),
            Command::ApplySuggestion { word, suggestion } => {
                let replaced = apply_suggestion(&mut self.doc, word, suggestion);
                self.drop_error(word);
                self.recheck_requested = true;
                tracing::debug!(
                    target: "quire::spell",
                    word = %word,
                    replaced,
                    "applied suggestion"
                );
                selection.clamped(&self.doc)
            }
            Command::IgnoreError { word } => {
                clear_marks(&mut self.doc, word);
                self.drop_error(word);
                self.recheck_requested = true;
                selection
            }
            Command::IgnoreAll { word } => {
                clear_marks(&mut self.doc, word);
                self.drop_error(word);
                self.ignored.insert(SmolStr::from(word.to_lowercase()));
                self.recheck_requested = true;
                selection
            }
            Command::Select(_) | Command::Undo | Command::Redo => return Ok(None),
        };
        Ok(Some(next))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            doc: self.doc.clone(),
            selection: self.selection.clone(),
            errors: self.errors.clone(),
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.doc = snapshot.doc;
        self.selection = snapshot.selection.clamped(&self.doc);
        self.errors = snapshot.errors;
        // The session-level suppression list survives undo.
        self.errors
            .errors
            .retain(|e| !self.ignored.contains(e.word.to_lowercase().as_str()));
        let active = active_words(&self.errors);
        sweep_marks(&mut self.doc, &active);
        self.touch();
    }

    fn touch(&mut self) {
        self.edit_seq += 1;
        self.dirty = true;
        self.metrics = measure(&self.doc, &self.config.page, &self.config.layout);
        self.autosave.record_change(Instant::now());
    }

    fn drop_error(&mut self, word: &str) {
        let word = word.to_lowercase();
        self.errors.errors.retain(|e| e.word.to_lowercase() != word);
        self.errors
            .suggestions
            .retain(|key, _| key.to_lowercase() != word);
    }

    /// Reset to a blank unsaved document.
    pub fn new_document(&mut self) {
        self.doc = Document::new();
        self.selection = Selection::caret(Position::new(self.doc.first_text_path(), 0));
        self.doc_id = None;
        self.title = SmolStr::new(DEFAULT_TITLE);
        self.errors = SpellCheckReport::default();
        self.grammar = GrammarReport::default();
        self.ignored.clear();
        self.history.clear();
        self.handles = HandleAllocator::default();
        self.autosave.reset();
        self.dirty = false;
        self.edit_seq = 0;
        self.check_seq = 0;
        self.check_in_flight = false;
        self.recheck_requested = false;
        self.metrics = measure(&self.doc, &self.config.page, &self.config.layout);
        tracing::info!(target: "quire::session", "new document");
    }

    /// Load a stored document into the session.
    ///
    /// Persisted spell highlights become the active error set again (without
    /// suggestions, which only a fresh check can provide), and image handle
    /// numbering resumes above anything the content carries. On error the
    /// session keeps its current state.
    pub fn open(&mut self, store: &impl DocumentStore, id: &str) -> Result<(), EditError> {
        let stored = store.get(id)?;
        let doc = parse(&stored.content)?;
        self.doc = doc;
        self.doc_id = Some(stored.id);
        self.title = stored.title;
        self.selection = Selection::caret(Position::new(self.doc.first_text_path(), 0));
        self.handles = HandleAllocator::default();
        enforce_constraints(&mut self.doc, &self.config.limits, &mut self.handles);
        self.errors = SpellCheckReport {
            errors: marked_words(&self.doc)
                .into_iter()
                .map(|word| SpellingError {
                    word,
                    position: None,
                    page: None,
                })
                .collect(),
            suggestions: BTreeMap::new(),
        };
        self.grammar = GrammarReport::default();
        self.ignored.clear();
        self.history.clear();
        self.autosave.reset();
        self.dirty = false;
        self.edit_seq = 0;
        self.check_seq = 0;
        self.check_in_flight = false;
        self.recheck_requested = false;
        self.metrics = measure(&self.doc, &self.config.page, &self.config.layout);
        tracing::info!(target: "quire::session", id, title = %self.title, "opened document");
        Ok(())
    }

    /// Persist the document, creating it on first save.
    pub fn save(&mut self, store: &mut impl DocumentStore) -> Result<SmolStr, EditError> {
        let content = serialize(&self.doc);
        let id = match self.doc_id.clone() {
            Some(id) => {
                store.update(&id, &self.title, &content)?;
                id
            }
            None => {
                let head = store.create(&self.title, &content)?;
                self.title = head.title;
                self.doc_id = Some(head.id.clone());
                head.id
            }
        };
        self.dirty = false;
        self.autosave.reset();
        tracing::info!(target: "quire::session", id = %id, "saved document");
        Ok(id)
    }

    /// Poll for a due auto-save and perform it. Returns whether a save went
    /// through. Failures are logged by the policy and retried on a later
    /// tick, never surfaced.
    pub fn autosave_tick(&mut self, store: &mut impl DocumentStore, now: Instant) -> bool {
        if !self.autosave.is_due(now) {
            return false;
        }
        let Some(id) = self.doc_id.clone() else {
            // Never persisted; a manual save has to assign an id first.
            return false;
        };
        let content = serialize(&self.doc);
        self.autosave.record_attempt();
        match store.auto_save(&id, &content) {
            Ok(()) => {
                self.autosave.record_success();
                self.dirty = false;
                tracing::debug!(target: "quire::autosave", id = %id, "auto-saved");
                true
            }
            Err(err) => {
                self.autosave.record_failure(now, &err);
                false
            }
        }
    }

    /// Export the persisted document. The exporter reads stored content, so
    /// an unsaved session has nothing to export.
    pub fn export(
        &self,
        exporter: &mut impl ExportService,
        format: ExportFormat,
    ) -> Result<ExportedFile, EditError> {
        let Some(id) = self.doc_id.as_deref() else {
            return Err(
                ServiceError::invalid("document must be saved before it can be exported").into(),
            );
        };
        Ok(exporter.export(id, format)?)
    }

    /// Start a spell check: hand back the text to check, or `None` while an
    /// earlier check is still in flight.
    pub fn begin_check(&mut self) -> Option<String> {
        if self.check_in_flight {
            return None;
        }
        self.check_in_flight = true;
        self.check_seq = self.edit_seq;
        Some(self.doc.plain_text())
    }

    /// Accept a finished check. Ignored words are filtered out, highlights
    /// are reconciled against the tree, and a recheck is requested if the
    /// document changed while the check was in flight.
    pub fn complete_check(&mut self, mut report: SpellCheckReport) {
        self.check_in_flight = false;
        report
            .errors
            .retain(|e| !self.ignored.contains(e.word.to_lowercase().as_str()));
        self.errors = report;
        let active = active_words(&self.errors);
        sweep_marks(&mut self.doc, &active);
        mark_errors(&mut self.doc, &active);
        if self.check_seq != self.edit_seq {
            self.recheck_requested = true;
        }
        tracing::debug!(
            target: "quire::spell",
            errors = self.errors.errors.len(),
            "spell check complete"
        );
    }

    /// Give up on an in-flight check, keeping the previous error state.
    pub fn abandon_check(&mut self) {
        self.check_in_flight = false;
    }

    /// Whether the session wants another check, consuming the request.
    pub fn take_recheck_request(&mut self) -> bool {
        mem::take(&mut self.recheck_requested)
    }

    /// Convenience wrapper running a full check against a language service.
    pub fn run_check(&mut self, service: &mut impl LanguageService) -> Result<(), EditError> {
        let Some(text) = self.begin_check() else {
            return Ok(());
        };
        match service.spell_check(&text) {
            Ok(report) => {
                self.complete_check(report);
                Ok(())
            }
            Err(err) => {
                self.abandon_check();
                Err(err.into())
            }
        }
    }

    /// Run a grammar pass. Findings are display-only and never marked into
    /// the tree.
    pub fn run_grammar_check(
        &mut self,
        service: &mut impl LanguageService,
    ) -> Result<&GrammarReport, EditError> {
        let text = self.doc.plain_text();
        self.grammar = service.grammar_check(&text)?;
        Ok(&self.grammar)
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

fn active_words(report: &SpellCheckReport) -> BTreeSet<SmolStr> {
    report
        .errors
        .iter()
        .map(|e| SmolStr::from(e.word.to_lowercase()))
        .collect()
}
