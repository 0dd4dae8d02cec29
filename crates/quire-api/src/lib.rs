//! quire-api: contracts between the document engine and its collaborators.
//!
//! This crate defines:
//! - serde payload types for persistence, export, and language checking
//! - the service traits the engine calls (`DocumentStore`, `ExportService`,
//!   `LanguageService`, `HealthCheck`)
//! - in-memory implementations used by tests and offline runs

pub mod error;
pub mod memory;
pub mod service;
pub mod types;

pub use error::ServiceError;
pub use memory::{MemoryExporter, MemoryStore, WordListChecker};
pub use service::{DocumentStore, ExportService, HealthCheck, LanguageService};
pub use types::{
    DocumentHead, ExportFormat, ExportedFile, GrammarIssue, GrammarReport, HealthStatus,
    SpellCheckReport, SpellingError, StoredDocument,
};
