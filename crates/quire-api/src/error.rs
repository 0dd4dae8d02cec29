//! Error type shared by every collaborator contract.

use miette::Diagnostic;
use smol_str::SmolStr;

/// Failure of a collaborator call (persistence, export, language, health).
///
/// The engine never rolls back in-memory state on one of these; the caller
/// decides whether to notify, retry, or drop the result.
#[derive(thiserror::Error, Debug, Diagnostic)]
#[non_exhaustive]
pub enum ServiceError {
    /// The requested document does not exist in the store.
    #[error("document {id} not found")]
    #[diagnostic(code(quire::api::not_found))]
    NotFound { id: SmolStr },

    /// The caller supplied a payload the service refuses to act on.
    #[error("invalid request: {reason}")]
    #[diagnostic(code(quire::api::invalid_input))]
    InvalidInput { reason: String },

    /// The service could not be reached or failed internally.
    #[error("service unavailable: {reason}")]
    #[diagnostic(code(quire::api::unavailable))]
    Unavailable { reason: String },
}

impl ServiceError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        ServiceError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        ServiceError::Unavailable {
            reason: reason.into(),
        }
    }
}
