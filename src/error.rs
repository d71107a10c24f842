//! Error types for the publishing pipeline

use thiserror::Error;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline errors.
///
/// `NotFound` and `Validation` are business outcomes: the worker turns them into a
/// FAILED status. `TransientStore` means the backing store could not serve the call.
/// `Logic` means a catalog or status invariant was broken and is never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("store unavailable: {0}")]
    TransientStore(String),

    #[error("invariant violated: {0}")]
    Logic(String),
}

impl Error {
    pub fn document_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            entity: "document",
            id: id.into(),
        }
    }

    pub fn publishing_record_not_found(id: impl Into<String>) -> Self {
        Error::NotFound {
            entity: "publishing record",
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Fatal errors must abort the current tick instead of being recorded and forgotten.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Logic(_))
    }
}
