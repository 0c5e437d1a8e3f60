//! Hand-written port fakes for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cgraph_core::{
    AnnotatedEntity, Annotation, ApiPortError, ApiPortResult, ContinuationToken,
    EntityResolverPort, Identifier, ListPage, ListSourcePort, MediaEntity, MediaStorePort,
    RepositoryError, ResolvedEntity, SnapshotStream, StoreChange,
};
use futures_util::stream;
use tokio::sync::broadcast;

// ============================================================================
// List source
// ============================================================================

/// Serves a fixed sequence of pages. Page `n` is requested with token
/// `{"page": n}`; past the last page it answers with an empty final page.
pub struct FakeListSource {
    name: String,
    pages: Vec<(Vec<String>, bool)>,
    failures: Mutex<Vec<ApiPortError>>,
    requested: Mutex<Vec<usize>>,
}

impl FakeListSource {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            pages: Vec::new(),
            failures: Mutex::new(Vec::new()),
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Append a page; `more` controls whether it carries a token.
    pub fn with_page(mut self, items: &[&str], more: bool) -> Self {
        self.pages
            .push((items.iter().map(ToString::to_string).collect(), more));
        self
    }

    /// Fail the next call with `error`.
    pub fn with_error(self, error: ApiPortError) -> Self {
        self.failures.lock().unwrap().push(error);
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    /// Page indices requested so far, in order.
    pub fn requested(&self) -> Vec<usize> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ListSourcePort for FakeListSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(
        &self,
        _term: &str,
        continuation: Option<&ContinuationToken>,
    ) -> ApiPortResult<ListPage> {
        let index = continuation
            .and_then(|token| token.params().find(|(k, _)| *k == "page"))
            .and_then(|(_, v)| v.parse::<usize>().ok())
            .unwrap_or(0);
        self.requested.lock().unwrap().push(index);

        if let Some(error) = self.failures.lock().unwrap().pop() {
            return Err(error);
        }

        let Some((items, more)) = self.pages.get(index) else {
            return Ok(ListPage::default());
        };
        let next = more.then(|| {
            [("page".to_string(), (index + 1).to_string())]
                .into_iter()
                .collect()
        });
        Ok(ListPage {
            items: items.clone(),
            next,
        })
    }
}

// ============================================================================
// Entity resolver
// ============================================================================

/// Resolves every id except those marked missing.
///
/// Page id `n` becomes `File:n.jpg`; a title gets a page id assigned in
/// order of first appearance.
#[derive(Default)]
pub struct FakeEntityResolver {
    missing: HashSet<Identifier>,
    title_ids: Mutex<HashMap<String, u64>>,
    batches: Mutex<Vec<Vec<Identifier>>>,
    failures: Mutex<Vec<ApiPortError>>,
}

impl FakeEntityResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_missing(mut self, id: Identifier) -> Self {
        self.missing.insert(id);
        self
    }

    pub fn with_error(self, error: ApiPortError) -> Self {
        self.failures.lock().unwrap().push(error);
        self
    }

    /// Every batch requested so far.
    pub fn batches(&self) -> Vec<Vec<Identifier>> {
        self.batches.lock().unwrap().clone()
    }

    fn entity_for(&self, id: &Identifier) -> MediaEntity {
        match id {
            Identifier::PageId(page_id) => MediaEntity::new(*page_id, format!("File:{page_id}.jpg")),
            Identifier::Title(title) => {
                let mut ids = self.title_ids.lock().unwrap();
                let next = ids.len() as u64 + 1;
                let page_id = *ids.entry(title.clone()).or_insert(next);
                MediaEntity::new(page_id, title.clone())
            }
        }
    }
}

#[async_trait]
impl EntityResolverPort for FakeEntityResolver {
    fn max_batch(&self) -> usize {
        3
    }

    async fn resolve(&self, ids: &[Identifier]) -> ApiPortResult<Vec<ResolvedEntity>> {
        self.batches.lock().unwrap().push(ids.to_vec());
        if let Some(error) = self.failures.lock().unwrap().pop() {
            return Err(error);
        }
        Ok(ids
            .iter()
            .filter(|id| !self.missing.contains(id))
            .map(|id| ResolvedEntity {
                requested: id.clone(),
                entity: self.entity_for(id),
            })
            .collect())
    }
}

// ============================================================================
// Media store
// ============================================================================

type Rows = Arc<Mutex<HashMap<u64, AnnotatedEntity>>>;

/// In-memory store. Live queries re-emit on every change.
pub struct FakeStore {
    rows: Rows,
    changes: broadcast::Sender<StoreChange>,
    fail_upserts: AtomicBool,
    upserts: AtomicUsize,
}

impl Default for FakeStore {
    fn default() -> Self {
        Self {
            rows: Arc::default(),
            changes: broadcast::channel(16).0,
            fail_upserts: AtomicBool::new(false),
            upserts: AtomicUsize::new(0),
        }
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    fn snapshot(rows: &Rows, ids: &[Identifier]) -> Vec<AnnotatedEntity> {
        let rows = rows.lock().unwrap();
        ids.iter()
            .filter_map(|id| rows.values().find(|row| row.entity.matches(id)).cloned())
            .collect()
    }

    fn annotate(&self, page_id: u64, update: impl FnOnce(&mut Annotation)) {
        {
            let mut rows = self.rows.lock().unwrap();
            if let Some(row) = rows.get_mut(&page_id) {
                update(row.annotation.get_or_insert_with(Annotation::default));
            }
        }
        let _ = self.changes.send(StoreChange {
            page_ids: vec![page_id],
            titles: Vec::new(),
        });
    }
}

#[async_trait]
impl MediaStorePort for FakeStore {
    async fn upsert(&self, entities: &[MediaEntity]) -> Result<(), RepositoryError> {
        if self.fail_upserts.load(Ordering::SeqCst) {
            return Err(RepositoryError::Storage("disk full".to_string()));
        }
        self.upserts.fetch_add(1, Ordering::SeqCst);
        {
            let mut rows = self.rows.lock().unwrap();
            for entity in entities {
                let annotation = rows.get(&entity.page_id).and_then(|r| r.annotation.clone());
                rows.insert(
                    entity.page_id,
                    AnnotatedEntity::new(entity.clone(), annotation),
                );
            }
        }
        let _ = self.changes.send(StoreChange {
            page_ids: entities.iter().map(|e| e.page_id).collect(),
            titles: entities.iter().map(|e| e.title.clone()).collect(),
        });
        Ok(())
    }

    async fn fetch(&self, ids: &[Identifier]) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        Ok(Self::snapshot(&self.rows, ids))
    }

    fn live_query(&self, ids: Vec<Identifier>) -> SnapshotStream {
        let rows = Arc::clone(&self.rows);
        let receiver = self.changes.subscribe();
        Box::pin(stream::unfold(
            (receiver, true),
            move |(mut receiver, first)| {
                let rows = Arc::clone(&rows);
                let ids = ids.clone();
                async move {
                    if !first {
                        match receiver.recv().await {
                            Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                            Err(broadcast::error::RecvError::Closed) => return None,
                        }
                    }
                    Some((
                        Ok::<_, RepositoryError>(Self::snapshot(&rows, &ids)),
                        (receiver, false),
                    ))
                }
            },
        ))
    }

    async fn set_bookmark(&self, page_id: u64, bookmarked: bool) -> Result<(), RepositoryError> {
        self.annotate(page_id, |a| a.bookmarked = bookmarked);
        Ok(())
    }

    async fn record_view(&self, page_id: u64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.annotate(page_id, |a| a.last_viewed_at = Some(at));
        Ok(())
    }

    async fn bookmarks(&self) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.is_bookmarked())
            .cloned()
            .collect())
    }

    async fn recently_viewed(&self, limit: u32) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        let mut viewed: Vec<AnnotatedEntity> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.annotation.as_ref().is_some_and(|a| a.last_viewed_at.is_some()))
            .cloned()
            .collect();
        viewed.sort_by_key(|row| std::cmp::Reverse(row.annotation.as_ref().and_then(|a| a.last_viewed_at)));
        viewed.truncate(limit as usize);
        Ok(viewed)
    }
}
