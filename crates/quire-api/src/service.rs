//! Service traits the engine is written against.
//!
//! All contracts are synchronous: the engine is single-threaded and only ever
//! sees completed results. A shell that talks to a remote backend implements
//! these over its own async transport and hands finished values across.

use crate::error::ServiceError;
use crate::types::{
    DocumentHead, ExportFormat, ExportedFile, GrammarReport, HealthStatus, SpellCheckReport,
    StoredDocument,
};

/// Document persistence: create, fetch, save, auto-save.
pub trait DocumentStore {
    /// Create a new document and return its assigned identity.
    fn create(&mut self, title: &str, content: &str) -> Result<DocumentHead, ServiceError>;

    /// Fetch a document by id.
    fn get(&self, id: &str) -> Result<StoredDocument, ServiceError>;

    /// Replace title and content of an existing document.
    fn update(&mut self, id: &str, title: &str, content: &str) -> Result<(), ServiceError>;

    /// Background save of content only. Same persistence as [`update`](Self::update),
    /// but failures are expected to be swallowed by the caller.
    fn auto_save(&mut self, id: &str, content: &str) -> Result<(), ServiceError>;
}

/// Export generation. The engine only supplies the id; the exporter reads the
/// persisted content itself.
pub trait ExportService {
    fn export(&mut self, id: &str, format: ExportFormat) -> Result<ExportedFile, ServiceError>;
}

/// Spell and grammar analysis over a plain-text projection.
pub trait LanguageService {
    fn spell_check(&mut self, content: &str) -> Result<SpellCheckReport, ServiceError>;

    fn grammar_check(&mut self, content: &str) -> Result<GrammarReport, ServiceError>;
}

/// Backend reachability probe.
pub trait HealthCheck {
    fn check_health(&self) -> HealthStatus;
}
