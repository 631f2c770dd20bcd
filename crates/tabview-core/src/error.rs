//! Error types for the table view engine

use thiserror::Error;

/// Core error type for table view operations
#[derive(Error, Debug)]
pub enum TabViewError {
    /// Bad configuration or input that the caller can fix inline:
    /// duplicate view name, unknown filter key, value of the wrong
    /// kind for a filter. Surfaced synchronously.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An external collaborator (bulk action callback, record fetch)
    /// failed. Engine state is left unchanged so the caller can retry.
    #[error("External action error: {0}")]
    ExternalAction(String),

    /// A referenced entity (saved view) no longer exists. Recoverable;
    /// delete paths treat this as a no-op rather than propagating.
    #[error("Not found: {0}")]
    NotFound(String),

    /// View persistence backend failure.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for table view operations
pub type Result<T> = std::result::Result<T, TabViewError>;
