//! Engine and cache configuration.

use std::time::Duration;

use cgraph_core::{IdKind, MAX_ENTITY_BATCH};

/// Default number of entities resolved per `paginate()` round.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// Default quiescence before the lazy cache flushes its misses.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(50);

/// Configuration for a [`PaginationEngine`](crate::PaginationEngine).
///
/// ```
/// use cgraph_core::IdKind;
/// use cgraph_paging::EngineConfig;
///
/// let config = EngineConfig::new()
///     .with_batch_size(30)
///     .with_id_kind(IdKind::PageId);
/// assert_eq!(config.batch_size(), 30);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    batch_size: usize,
    id_kind: IdKind,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            id_kind: IdKind::Title,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entities per round. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Identifier kind the engine operates on for its whole lifetime.
    #[must_use]
    pub const fn with_id_kind(mut self, id_kind: IdKind) -> Self {
        self.id_kind = id_kind;
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub const fn id_kind(&self) -> IdKind {
        self.id_kind
    }
}

/// Configuration for a [`LazyResolvingCache`](crate::LazyResolvingCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    debounce: Duration,
    max_batch: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_batch: MAX_ENTITY_BATCH,
        }
    }
}

impl CacheConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Quiescence period after the last miss before fetching.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Keys per remote call. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch.max(1);
        self
    }

    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    pub const fn max_batch(&self) -> usize {
        self.max_batch
    }
}
