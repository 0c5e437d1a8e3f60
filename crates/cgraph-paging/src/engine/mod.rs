//! Pagination engine: the orchestrator behind an incremental result list.
//!
//! # Architecture
//!
//! ```text
//! paginate() ──► round task ──► Pipeline::advance
//!                                  ├─ SourceFetcher × N   (join_all)
//!                                  ├─ DeduplicatingIdQueue × N
//!                                  └─ BatchResolver ──► MediaStorePort::upsert
//!                 │
//!                 ▼
//!          entries (IndexMap) ──► watch::Sender<Vec<ResultEntry>>
//!                 ▲
//!                 └── ReconciliationObserver ◄── MediaStorePort::live_query
//! ```
//!
//! # Concurrency
//!
//! - At most one round is in flight; `paginate()` checks and sets
//!   [`Status::Paginating`] under one lock.
//! - The round task holds the pipeline for its whole duration.
//! - Every round carries the generation it started in. [`cancel`] bumps the
//!   generation, so a round that outlives its cancellation cannot publish.
//!
//! [`cancel`]: PaginationEngine::cancel

mod pipeline;
mod status;

pub use status::Status;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cgraph_core::{
    AnnotatedEntity, EntityResolverPort, ListSourcePort, MediaEntity, MediaStorePort,
};
use chrono::Utc;
use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::EngineConfig;
use crate::error::{PagingError, PagingResult};
use crate::fetcher::SourceFetcher;
use crate::reconcile::{ReconciliationObserver, reconcile};
use crate::resolver::BatchResolver;

use pipeline::Pipeline;

/// One row of the result list.
pub type ResultEntry = AnnotatedEntity;

/// Ports an engine is wired to.
pub struct EngineDeps {
    /// List sources, merged in this order.
    pub sources: Vec<Arc<dyn ListSourcePort>>,
    pub resolver: Arc<dyn EntityResolverPort>,
    pub store: Arc<dyn MediaStorePort>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A round in flight.
struct Round {
    task: JoinHandle<()>,
    /// Status to restore if the round is cancelled.
    previous: Status,
}

/// State shared between the engine handle, its round task and its observer.
struct Shared {
    term: String,
    config: EngineConfig,
    pipeline: tokio::sync::Mutex<Pipeline>,
    store: Arc<dyn MediaStorePort>,
    status: watch::Sender<Status>,
    results: watch::Sender<Vec<ResultEntry>>,
    /// Result list keyed by page id, in fetch order.
    entries: Mutex<IndexMap<u64, ResultEntry>>,
    last_error: Mutex<Option<PagingError>>,
    observer: Mutex<ReconciliationObserver>,
    /// Bumped on cancel; read and written under the `entries` lock.
    generation: AtomicU64,
}

impl Shared {
    async fn run_round(self: Arc<Self>, generation: u64) {
        let outcome = {
            let mut pipeline = self.pipeline.lock().await;
            pipeline.advance(&self.term).await
        };

        match outcome {
            Ok(round) => {
                let status = Status::Idle {
                    reached_end: round.reached_end,
                };
                if !self.commit(generation, round.entities, status) {
                    debug!(term = %self.term, "Round was cancelled, dropping its results");
                }
            }
            Err(e) => {
                error!(term = %self.term, error = %e, "Pagination round failed");
                self.fail(generation, e);
            }
        }
    }

    /// Append resolved entities and settle the status.
    ///
    /// Returns false when the round belongs to a cancelled generation.
    fn commit(self: &Arc<Self>, generation: u64, entities: Vec<MediaEntity>, status: Status) -> bool {
        let mut entries = lock(&self.entries);
        if self.generation.load(Ordering::SeqCst) != generation {
            return false;
        }

        let before = entries.len();
        for entity in entities {
            entries
                .entry(entity.page_id)
                .or_insert_with(|| AnnotatedEntity::new(entity, None));
        }
        let appended = entries.len() - before;

        if appended > 0 {
            self.results.send_replace(entries.values().cloned().collect());
        }

        {
            let mut observer = lock(&self.observer);
            if !entries.is_empty() && (appended > 0 || !observer.is_active()) {
                let kind = self.config.id_kind();
                let ids = entries.values().map(|e| e.entity.identifier(kind)).collect();
                let weak = Arc::downgrade(self);
                observer.observe(ids, move |snapshot| Self::on_snapshot(&weak, snapshot));
            }
        }

        *lock(&self.last_error) = None;
        self.status.send_replace(status);
        info!(
            term = %self.term,
            appended,
            total = entries.len(),
            status = %status,
            "Pagination round finished"
        );
        true
    }

    fn fail(&self, generation: u64, error: PagingError) {
        let _entries = lock(&self.entries);
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        *lock(&self.last_error) = Some(error);
        self.status.send_replace(Status::Error);
    }

    fn on_snapshot(weak: &Weak<Self>, snapshot: Vec<AnnotatedEntity>) {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let mut entries = lock(&shared.entries);
        if reconcile(&mut entries, snapshot) {
            shared.results.send_replace(entries.values().cloned().collect());
        }
    }
}

/// Incrementally merges several remote lists into one resolved, persisted
/// and live-reconciled result list for a search term.
///
/// Results and status are published on `watch` channels. Dropping the
/// engine aborts its round and its observer.
pub struct PaginationEngine {
    shared: Arc<Shared>,
    round: Mutex<Option<Round>>,
    handle: Handle,
}

impl PaginationEngine {
    /// Create an engine on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// [`PagingError::NoRuntime`] when called outside a runtime.
    pub fn new(term: impl Into<String>, config: EngineConfig, deps: EngineDeps) -> PagingResult<Self> {
        let handle = Handle::try_current().map_err(|_| PagingError::NoRuntime)?;
        Ok(Self::with_handle(term, config, deps, handle))
    }

    /// Create an engine that spawns its tasks on `handle`.
    pub fn with_handle(
        term: impl Into<String>,
        config: EngineConfig,
        deps: EngineDeps,
        handle: Handle,
    ) -> Self {
        let term = term.into();
        let kind = config.id_kind();
        let source_count = deps.sources.len();

        let fetchers = deps
            .sources
            .into_iter()
            .map(|source| SourceFetcher::new(source, kind))
            .collect();
        let resolver = BatchResolver::new(deps.resolver, Arc::clone(&deps.store), kind);
        let pipeline = Pipeline::new(fetchers, resolver, config.batch_size());

        info!(
            term = %term,
            sources = source_count,
            batch_size = config.batch_size(),
            kind = %kind,
            "Created pagination engine"
        );

        let shared = Arc::new(Shared {
            term,
            config,
            pipeline: tokio::sync::Mutex::new(pipeline),
            observer: Mutex::new(ReconciliationObserver::new(
                Arc::clone(&deps.store),
                handle.clone(),
            )),
            store: deps.store,
            status: watch::channel(Status::Unknown).0,
            results: watch::channel(Vec::new()).0,
            entries: Mutex::new(IndexMap::new()),
            last_error: Mutex::new(None),
            generation: AtomicU64::new(0),
        });

        Self {
            shared,
            round: Mutex::new(None),
            handle,
        }
    }

    /// Start a round unless one is in flight or the end was reached.
    ///
    /// Returns whether a round was started. The status is `Paginating`
    /// by the time this returns `true`.
    pub fn paginate(&self) -> bool {
        let mut round = lock(&self.round);
        let previous = *self.shared.status.borrow();
        if previous.is_paginating() || previous.is_terminal() {
            debug!(term = %self.shared.term, status = %previous, "paginate() ignored");
            return false;
        }

        self.shared.status.send_replace(Status::Paginating);
        let generation = self.shared.generation.load(Ordering::SeqCst);
        let shared = Arc::clone(&self.shared);
        let task = self.handle.spawn(shared.run_round(generation));
        *round = Some(Round { task, previous });
        true
    }

    /// Abort the round in flight and the observer.
    ///
    /// A cancelled round publishes nothing and the status returns to what it
    /// was before that round started. Ids it already persisted stay in the
    /// store; ids it selected stay queued.
    pub fn cancel(&self) {
        let mut round = lock(&self.round);
        {
            let _entries = lock(&self.shared.entries);
            self.shared.generation.fetch_add(1, Ordering::SeqCst);
        }

        if let Some(round) = round.take() {
            round.task.abort();
            if self.shared.status.borrow().is_paginating() {
                self.shared.status.send_replace(round.previous);
            }
        }
        lock(&self.shared.observer).stop();
        debug!(term = %self.shared.term, "Pagination cancelled");
    }

    pub fn status(&self) -> Status {
        *self.shared.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<Status> {
        self.shared.status.subscribe()
    }

    /// Wait until no round is in flight and return the status.
    pub async fn wait_until_settled(&self) -> Status {
        let mut status = self.shared.status.subscribe();
        let settled = status.wait_for(|s| s.is_settled()).await.map(|s| *s);
        settled.unwrap_or_else(|_| self.status())
    }

    /// Current result list.
    pub fn results(&self) -> Vec<ResultEntry> {
        self.shared.results.borrow().clone()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<Vec<ResultEntry>> {
        self.shared.results.subscribe()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.shared.entries).is_empty()
    }

    /// Error that put the engine in [`Status::Error`], cleared by the next
    /// successful round.
    pub fn last_error(&self) -> Option<PagingError> {
        lock(&self.shared.last_error).clone()
    }

    /// Bookmark or unbookmark a page. The result list picks the change up
    /// through the store.
    pub async fn set_bookmark(&self, page_id: u64, bookmarked: bool) -> PagingResult<()> {
        self.shared.store.set_bookmark(page_id, bookmarked).await?;
        Ok(())
    }

    /// Record that the user viewed a page just now.
    pub async fn record_view(&self, page_id: u64) -> PagingResult<()> {
        self.shared.store.record_view(page_id, Utc::now()).await?;
        Ok(())
    }

    pub fn term(&self) -> &str {
        &self.shared.term
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }
}

impl Drop for PaginationEngine {
    fn drop(&mut self) {
        if let Some(round) = lock(&self.round).take() {
            round.task.abort();
        }
        lock(&self.shared.observer).stop();
    }
}
