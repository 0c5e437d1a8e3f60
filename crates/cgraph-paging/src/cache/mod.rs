//! Synchronous lookups backed by debounced background batch fetches.
//!
//! [`LazyResolvingCache::get`] never blocks: a miss is recorded and `None`
//! is returned. Once misses stop arriving for the configured debounce
//! period, every recorded miss is looked up in the persistent store and
//! whatever is left is fetched remotely in chunks. Resolved keys are
//! announced on a broadcast channel so callers know when to look again.

mod labels;

pub use labels::{LabelCache, PersistedLabels, RemoteLabels, label_cache};

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use async_trait::async_trait;
use cgraph_core::{ApiPortResult, RepositoryError};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::CacheConfig;
use crate::error::{PagingError, PagingResult};

/// Capacity of the resolved-keys channel.
const UPDATE_CAPACITY: usize = 64;

/// Remote source of values.
#[async_trait]
pub trait BatchLoader<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + 'static,
{
    /// Most keys one [`load`](Self::load) call accepts.
    fn max_batch(&self) -> usize {
        usize::MAX
    }

    /// Load values for `keys`. Keys with no value are absent from the map.
    async fn load(&self, keys: &[K]) -> ApiPortResult<HashMap<K, V>>;
}

/// Persistent second level consulted before the loader.
#[async_trait]
pub trait CacheStore<K, V>: Send + Sync
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    async fn get_many(&self, keys: &[K]) -> Result<HashMap<K, V>, RepositoryError>;

    async fn put_many(&self, values: &HashMap<K, V>) -> Result<(), RepositoryError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct State<K, V> {
    resolved: HashMap<K, V>,
    /// Requested but not resolved yet.
    missing: HashSet<K>,
    /// Subset of `missing` a flush is working on.
    in_flight: HashSet<K>,
    /// The loader answered but had no value.
    absent: HashSet<K>,
    timer: Option<JoinHandle<()>>,
}

impl<K, V> Default for State<K, V> {
    fn default() -> Self {
        Self {
            resolved: HashMap::new(),
            missing: HashSet::new(),
            in_flight: HashSet::new(),
            absent: HashSet::new(),
            timer: None,
        }
    }
}

struct Inner<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    state: Mutex<State<K, V>>,
    loader: Arc<dyn BatchLoader<K, V>>,
    store: Option<Arc<dyn CacheStore<K, V>>>,
    config: CacheConfig,
    handle: Handle,
    updates: broadcast::Sender<Vec<K>>,
}

/// Cached, lazily resolved key/value lookups.
///
/// Cheap to clone; clones share one cache.
pub struct LazyResolvingCache<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for LazyResolvingCache<K, V>
where
    K: Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> LazyResolvingCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`PagingError::NoRuntime`] when called outside a runtime.
    pub fn new(
        loader: Arc<dyn BatchLoader<K, V>>,
        store: Option<Arc<dyn CacheStore<K, V>>>,
        config: CacheConfig,
    ) -> PagingResult<Self> {
        let handle = Handle::try_current().map_err(|_| PagingError::NoRuntime)?;
        Ok(Self::with_handle(loader, store, config, handle))
    }

    /// Create a cache whose timers and flushes run on `handle`.
    pub fn with_handle(
        loader: Arc<dyn BatchLoader<K, V>>,
        store: Option<Arc<dyn CacheStore<K, V>>>,
        config: CacheConfig,
        handle: Handle,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State::default()),
                loader,
                store,
                config,
                handle,
                updates: broadcast::channel(UPDATE_CAPACITY).0,
            }),
        }
    }

    /// Cached value for `key`.
    ///
    /// On a miss the key is queued and the debounce timer restarted.
    /// Keys the loader already answered without a value return `None`
    /// without queueing.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = lock(&self.inner.state);
        if let Some(value) = state.resolved.get(key) {
            return Some(value.clone());
        }
        if state.absent.contains(key) {
            return None;
        }
        state.missing.insert(key.clone());
        self.restart_timer(&mut state);
        None
    }

    /// Seed a value.
    pub fn insert(&self, key: K, value: V) {
        {
            let mut state = lock(&self.inner.state);
            state.missing.remove(&key);
            state.absent.remove(&key);
            state.resolved.insert(key.clone(), value);
        }
        let _ = self.inner.updates.send(vec![key]);
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        lock(&self.inner.state).resolved.len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.inner.state).resolved.is_empty()
    }

    /// Keys waiting to be resolved, including ones a failed fetch left behind.
    pub fn pending_len(&self) -> usize {
        lock(&self.inner.state).missing.len()
    }

    /// Receive the keys of every batch of newly resolved values.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<K>> {
        self.inner.updates.subscribe()
    }

    fn restart_timer(&self, state: &mut State<K, V>) {
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let weak: Weak<Inner<K, V>> = Arc::downgrade(&self.inner);
        let debounce = self.inner.config.debounce();
        state.timer = Some(self.inner.handle.spawn(async move {
            tokio::time::sleep(debounce).await;
            if let Some(inner) = weak.upgrade() {
                // Detached so the next miss cannot abort a running flush.
                let handle = inner.handle.clone();
                handle.spawn(inner.flush());
            }
        }));
    }
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn flush(self: Arc<Self>) {
        let keys: Vec<K> = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            let keys: Vec<K> = state
                .missing
                .iter()
                .filter(|key| !state.in_flight.contains(*key))
                .cloned()
                .collect();
            state.in_flight.extend(keys.iter().cloned());
            keys
        };
        if keys.is_empty() {
            return;
        }

        let mut found = HashMap::new();
        if let Some(store) = &self.store {
            match store.get_many(&keys).await {
                Ok(stored) => found = stored,
                Err(e) => warn!(error = %e, "Cache store lookup failed"),
            }
        }
        let from_store = found.len();
        let remote: Vec<K> = keys
            .iter()
            .filter(|key| !found.contains_key(*key))
            .cloned()
            .collect();
        let mut resolved = self.settle(found, &[]);

        let chunk_size = self
            .config
            .max_batch()
            .min(self.loader.max_batch())
            .max(1);
        for chunk in remote.chunks(chunk_size) {
            match self.loader.load(chunk).await {
                Ok(values) => {
                    if let Some(store) = &self.store {
                        if !values.is_empty() {
                            if let Err(e) = store.put_many(&values).await {
                                warn!(error = %e, "Failed to persist fetched values");
                            }
                        }
                    }
                    resolved += self.settle(values, chunk);
                }
                Err(e) => {
                    warn!(
                        keys = chunk.len(),
                        error = %e,
                        "Batch load failed, keys stay pending"
                    );
                    let mut state = lock(&self.state);
                    for key in chunk {
                        state.in_flight.remove(key);
                    }
                }
            }
        }

        debug!(
            requested = keys.len(),
            from_store,
            resolved,
            "Flushed cache misses"
        );
    }

    /// Publish `values` and retire `answered` keys that came back without one.
    ///
    /// Returns the number of keys resolved.
    fn settle(&self, values: HashMap<K, V>, answered: &[K]) -> usize {
        let resolved: Vec<K> = {
            let mut guard = lock(&self.state);
            let state = &mut *guard;
            for key in answered {
                state.in_flight.remove(key);
                if !values.contains_key(key) {
                    state.missing.remove(key);
                    state.absent.insert(key.clone());
                }
            }
            values
                .into_iter()
                .map(|(key, value)| {
                    state.in_flight.remove(&key);
                    state.missing.remove(&key);
                    state.resolved.insert(key.clone(), value);
                    key
                })
                .collect()
        };

        let count = resolved.len();
        if count > 0 {
            let _ = self.updates.send(resolved);
        }
        count
    }
}
