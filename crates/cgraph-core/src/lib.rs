//! Core domain types and port definitions for commonsgraph.
//!
//! This crate owns the vocabulary shared by every adapter: identifiers,
//! resolved media entities, user annotations, the structured-data value
//! model, and the port traits that the paging engine talks to. It contains
//! no HTTP or SQL code.

pub mod domain;
pub mod paths;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    AnnotatedEntity, Annotation, DataValue, DataValueError, EntityIdValue, GlobeCoordinate,
    IdKind, Identifier, MediaEntity, MonolingualText, Quantity, Rank, Snak, SnakKind, Statement,
    TimeValue,
};
pub use paths::{PathError, data_root, database_path};
pub use ports::{
    ApiPortError, ApiPortResult, ContinuationToken, EntityResolverPort, LabelRepository,
    LabelResolverPort, ListPage, ListSourcePort, MAX_ENTITY_BATCH, MediaStorePort,
    RepositoryError, ResolvedEntity, SnapshotStream, StoreChange, Stores,
};
