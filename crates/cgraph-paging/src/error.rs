//! Engine error type.

use cgraph_core::{ApiPortError, IdKind, RepositoryError};
use thiserror::Error;

/// Errors that fail a pagination round or prevent construction.
#[derive(Debug, Clone, Error)]
pub enum PagingError {
    /// A batch contained an identifier of the other kind.
    #[error("Identifier kind mismatch: expected {expected}, found {found}")]
    KindMismatch {
        /// Kind fixed at construction
        expected: IdKind,
        /// Kind that showed up
        found: IdKind,
    },

    /// Remote entity resolution failed.
    #[error("Remote API error: {0}")]
    Api(#[from] ApiPortError),

    /// Local store failed.
    #[error("Store error: {0}")]
    Store(#[from] RepositoryError),

    /// Constructed outside a tokio runtime.
    #[error("No tokio runtime available")]
    NoRuntime,
}

/// Result type alias for engine operations.
pub type PagingResult<T> = Result<T, PagingError>;
