//! Store implementations using `SQLite`.
//!
//! All SQL lives here. The `SqlitePool` never appears in a port signature.

mod row_mappers;
mod sqlite_label_repository;
mod sqlite_media_store;

pub use sqlite_label_repository::SqliteLabelRepository;
pub use sqlite_media_store::SqliteMediaStore;
