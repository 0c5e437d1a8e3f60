//! Local store port for resolved entities and user annotations.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::stream::BoxStream;

use super::RepositoryError;
use crate::domain::{AnnotatedEntity, Identifier, MediaEntity};

/// A stream of full snapshots for a fixed id set.
pub type SnapshotStream = BoxStream<'static, Result<Vec<AnnotatedEntity>, RepositoryError>>;

/// Rows touched by one committed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreChange {
    pub page_ids: Vec<u64>,
    pub titles: Vec<String>,
}

impl StoreChange {
    /// Whether this change can affect a query over `ids`.
    ///
    /// `known_page_ids` are the page ids present in the last snapshot, so that
    /// annotation writes (which only carry a page id) reach title queries.
    pub fn touches(&self, ids: &[Identifier], known_page_ids: &HashSet<u64>) -> bool {
        if self.page_ids.iter().any(|id| known_page_ids.contains(id)) {
            return true;
        }
        ids.iter().any(|id| match id {
            Identifier::Title(title) => self.titles.iter().any(|t| t == title),
            Identifier::PageId(page_id) => self.page_ids.contains(page_id),
        })
    }
}

/// Port trait for the local media store.
///
/// # Design Rules
///
/// - `upsert` is transactional and idempotent by page id
/// - every committed write is visible to open live queries
/// - no `sqlx` types in signatures
#[async_trait]
pub trait MediaStorePort: Send + Sync {
    /// Insert or update entities in a single transaction.
    async fn upsert(&self, entities: &[MediaEntity]) -> Result<(), RepositoryError>;

    /// Point lookup, returned in request order; unknown ids are skipped.
    async fn fetch(&self, ids: &[Identifier]) -> Result<Vec<AnnotatedEntity>, RepositoryError>;

    /// Subscribe to `ids`.
    ///
    /// Emits the current snapshot first, then a fresh snapshot after every
    /// committed change touching the set.
    fn live_query(&self, ids: Vec<Identifier>) -> SnapshotStream;

    /// Set or clear the bookmark flag.
    async fn set_bookmark(&self, page_id: u64, bookmarked: bool) -> Result<(), RepositoryError>;

    /// Record that the user viewed a page at `at`.
    async fn record_view(&self, page_id: u64, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    /// All bookmarked entities, most recently changed first.
    async fn bookmarks(&self) -> Result<Vec<AnnotatedEntity>, RepositoryError>;

    /// Most recently viewed entities.
    async fn recently_viewed(&self, limit: u32) -> Result<Vec<AnnotatedEntity>, RepositoryError>;
}
