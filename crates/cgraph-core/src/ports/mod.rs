//! Port definitions (trait abstractions) for external systems.
//!
//! Ports define the interfaces that the paging engine expects from
//! infrastructure. They contain no implementation details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `sqlx` or `reqwest` types in any signature
//! - Remote failures are reported as [`ApiPortError`], storage failures as
//!   [`RepositoryError`]
//! - Live queries are plain `Stream`s of full snapshots

pub mod api_error;
pub mod entity_resolver;
pub mod labels;
pub mod list_source;
pub mod media_store;

use std::sync::Arc;
use thiserror::Error;

pub use api_error::{ApiPortError, ApiPortResult};
pub use entity_resolver::{EntityResolverPort, MAX_ENTITY_BATCH, ResolvedEntity};
pub use labels::{LabelRepository, LabelResolverPort};
pub use list_source::{ContinuationToken, ListPage, ListSourcePort};
pub use media_store::{MediaStorePort, SnapshotStream, StoreChange};

/// Container for the local store trait objects.
///
/// Lives in core so that consumers can be wired without depending on
/// `cgraph-db`.
#[derive(Clone)]
pub struct Stores {
    /// Media entities, annotations and live queries.
    pub media: Arc<dyn MediaStorePort>,
    /// Persisted knowledge-graph labels.
    pub labels: Arc<dyn LabelRepository>,
}

impl Stores {
    /// Create a new Stores container.
    pub fn new(media: Arc<dyn MediaStorePort>, labels: Arc<dyn LabelRepository>) -> Self {
        Self { media, labels }
    }
}

/// Domain-specific errors for repository operations.
///
/// This error type abstracts away storage implementation details (e.g., sqlx errors)
/// and provides a clean interface for services to handle storage failures.
#[derive(Debug, Clone, Error)]
pub enum RepositoryError {
    /// The requested entity was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage backend error (database, filesystem, etc.).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A constraint was violated (e.g., foreign key, unique constraint).
    #[error("Constraint violation: {0}")]
    Constraint(String),
}
