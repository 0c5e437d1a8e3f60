//! Incremental multi-source pagination for commonsgraph.
//!
//! A [`PaginationEngine`] merges several independently paginated remote
//! lists into one deduplicated result list. Each `paginate()` round
//! refills the per-source queues, resolves a batch of entities, persists
//! them through the local store and appends them in request order. A live
//! query over the store keeps bookmarks and view history in the list up to
//! date without reordering it.
//!
//! [`LazyResolvingCache`] provides synchronous lookups with debounced
//! background batch resolution, used for knowledge-graph labels.
#![deny(unsafe_code)]

pub mod cache;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod queue;
pub mod reconcile;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{
    BatchLoader, CacheStore, LabelCache, LazyResolvingCache, PersistedLabels, RemoteLabels,
    label_cache,
};
pub use config::{CacheConfig, DEFAULT_BATCH_SIZE, DEFAULT_DEBOUNCE, EngineConfig};
pub use cursor::ContinuationCursor;
pub use engine::{EngineDeps, PaginationEngine, ResultEntry, Status};
pub use error::{PagingError, PagingResult};
pub use fetcher::{FetchOutcome, SourceFetcher, normalize};
pub use queue::DeduplicatingIdQueue;
pub use reconcile::{ReconciliationObserver, reconcile};
pub use resolver::BatchResolver;
