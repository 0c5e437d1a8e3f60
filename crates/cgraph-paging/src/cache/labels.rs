//! Knowledge-graph label cache.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use cgraph_core::{ApiPortResult, LabelRepository, LabelResolverPort, RepositoryError};

use super::{BatchLoader, CacheStore, LazyResolvingCache};
use crate::config::CacheConfig;
use crate::error::PagingResult;

/// Entity id (`Q146`) to display label, for one language.
pub type LabelCache = LazyResolvingCache<String, String>;

/// Loads labels through a [`LabelResolverPort`].
pub struct RemoteLabels {
    resolver: Arc<dyn LabelResolverPort>,
    language: String,
}

impl RemoteLabels {
    pub fn new(resolver: Arc<dyn LabelResolverPort>, language: impl Into<String>) -> Self {
        Self {
            resolver,
            language: language.into(),
        }
    }
}

#[async_trait]
impl BatchLoader<String, String> for RemoteLabels {
    fn max_batch(&self) -> usize {
        self.resolver.max_batch()
    }

    async fn load(&self, keys: &[String]) -> ApiPortResult<HashMap<String, String>> {
        self.resolver.resolve_labels(keys, &self.language).await
    }
}

/// Reads and writes labels through a [`LabelRepository`].
pub struct PersistedLabels {
    repo: Arc<dyn LabelRepository>,
    language: String,
}

impl PersistedLabels {
    pub fn new(repo: Arc<dyn LabelRepository>, language: impl Into<String>) -> Self {
        Self {
            repo,
            language: language.into(),
        }
    }
}

#[async_trait]
impl CacheStore<String, String> for PersistedLabels {
    async fn get_many(&self, keys: &[String]) -> Result<HashMap<String, String>, RepositoryError> {
        self.repo.get_labels(keys, &self.language).await
    }

    async fn put_many(&self, values: &HashMap<String, String>) -> Result<(), RepositoryError> {
        self.repo.save_labels(values, &self.language).await
    }
}

/// Build a label cache for `language` on the current runtime.
///
/// # Errors
///
/// [`PagingError::NoRuntime`](crate::PagingError::NoRuntime) outside a runtime.
pub fn label_cache(
    resolver: Arc<dyn LabelResolverPort>,
    repo: Option<Arc<dyn LabelRepository>>,
    language: &str,
    config: CacheConfig,
) -> PagingResult<LabelCache> {
    let loader = Arc::new(RemoteLabels::new(resolver, language));
    let store = repo.map(|repo| {
        Arc::new(PersistedLabels::new(repo, language)) as Arc<dyn CacheStore<String, String>>
    });
    LazyResolvingCache::new(loader, store, config)
}
