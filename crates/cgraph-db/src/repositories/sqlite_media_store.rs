//! `SQLite` implementation of the `MediaStorePort` trait.

use std::collections::{HashMap, HashSet};

use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use cgraph_core::{
    AnnotatedEntity, Identifier, MediaEntity, MediaStorePort, RepositoryError, SnapshotStream,
    StoreChange,
};

use super::row_mappers::{
    ANNOTATED_SELECT, MAX_BIND_PARAMS, format_datetime, placeholders, row_to_annotated, storage,
    to_db_id,
};

/// Change notifications buffered per live query before it falls back to a
/// full re-read.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// `SQLite` implementation of the `MediaStorePort` trait.
///
/// Entities are stored as JSON keyed by page id with a unique title. Every
/// committed write is broadcast as a [`StoreChange`] so that open live
/// queries can re-read.
pub struct SqliteMediaStore {
    pool: SqlitePool,
    changes: broadcast::Sender<StoreChange>,
}

impl SqliteMediaStore {
    pub fn new(pool: SqlitePool) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, changes }
    }

    fn publish(&self, change: StoreChange) {
        // No receivers simply means no live queries are open.
        let _ = self.changes.send(change);
    }

    async fn upsert_annotation(
        &self,
        page_id: u64,
        sql: &str,
        bind: AnnotationBind,
    ) -> Result<(), RepositoryError> {
        let now = format_datetime(Utc::now());
        let query = sqlx::query(sql).bind(to_db_id(page_id)?);
        let query = match bind {
            AnnotationBind::Bookmarked(flag) => query.bind(i64::from(flag)),
            AnnotationBind::ViewedAt(at) => query.bind(format_datetime(at)),
        };
        query
            .bind(&now)
            .execute(&self.pool)
            .await
            .map_err(storage)?;

        self.publish(StoreChange {
            page_ids: vec![page_id],
            titles: Vec::new(),
        });
        Ok(())
    }

    async fn query_annotated(
        &self,
        sql: &str,
        limit: Option<u32>,
    ) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        let mut query = sqlx::query(sql);
        if let Some(limit) = limit {
            query = query.bind(i64::from(limit));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(storage)?;
        rows.iter().map(row_to_annotated).collect()
    }
}

enum AnnotationBind {
    Bookmarked(bool),
    ViewedAt(DateTime<Utc>),
}

/// Look up `ids`, returning rows in request order without duplicates.
async fn fetch_annotated(
    pool: &SqlitePool,
    ids: &[Identifier],
) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
    let mut by_page_id: HashMap<u64, AnnotatedEntity> = HashMap::new();

    for chunk in ids.chunks(MAX_BIND_PARAMS) {
        let titles: Vec<&str> = chunk.iter().filter_map(Identifier::as_title).collect();
        let page_ids = chunk
            .iter()
            .filter_map(Identifier::as_page_id)
            .map(to_db_id)
            .collect::<Result<Vec<_>, _>>()?;

        let sql = format!(
            "{ANNOTATED_SELECT} WHERE m.title IN ({}) OR m.page_id IN ({})",
            placeholders(titles.len().max(1)),
            placeholders(page_ids.len().max(1)),
        );

        let mut query = sqlx::query(&sql);
        if titles.is_empty() {
            query = query.bind(None::<String>);
        }
        for title in &titles {
            query = query.bind(*title);
        }
        if page_ids.is_empty() {
            query = query.bind(None::<i64>);
        }
        for page_id in &page_ids {
            query = query.bind(*page_id);
        }

        for row in query.fetch_all(pool).await.map_err(storage)? {
            let annotated = row_to_annotated(&row)?;
            by_page_id.insert(annotated.entity.page_id, annotated);
        }
    }

    let by_title: HashMap<&str, u64> = by_page_id
        .values()
        .map(|a| (a.entity.title.as_str(), a.entity.page_id))
        .collect();

    let mut seen = HashSet::new();
    let ordered = ids
        .iter()
        .filter_map(|id| {
            let page_id = match id {
                Identifier::Title(title) => *by_title.get(title.as_str())?,
                Identifier::PageId(page_id) => *page_id,
            };
            let found = by_page_id.get(&page_id)?;
            seen.insert(page_id).then(|| found.clone())
        })
        .collect();
    Ok(ordered)
}

#[async_trait]
impl MediaStorePort for SqliteMediaStore {
    async fn upsert(&self, entities: &[MediaEntity]) -> Result<(), RepositoryError> {
        if entities.is_empty() {
            return Ok(());
        }

        let now = format_datetime(Utc::now());
        let mut change = StoreChange::default();
        let mut tx = self.pool.begin().await.map_err(storage)?;

        for entity in entities {
            let page_id = to_db_id(entity.page_id)?;
            let payload = serde_json::to_string(entity)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

            let previous_title: Option<String> =
                sqlx::query_scalar("SELECT title FROM media_entities WHERE page_id = ?")
                    .bind(page_id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(storage)?;

            // A title now owned by another page id belongs to the newer entity.
            let displaced: Vec<i64> = sqlx::query_scalar(
                "SELECT page_id FROM media_entities WHERE title = ? AND page_id != ?",
            )
            .bind(&entity.title)
            .bind(page_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(storage)?;
            if !displaced.is_empty() {
                sqlx::query("DELETE FROM media_entities WHERE title = ? AND page_id != ?")
                    .bind(&entity.title)
                    .bind(page_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(storage)?;
            }

            let written = sqlx::query(
                r"
                INSERT INTO media_entities (page_id, title, payload, updated_at)
                VALUES (?, ?, ?, ?)
                ON CONFLICT(page_id) DO UPDATE SET
                    title = excluded.title,
                    payload = excluded.payload,
                    updated_at = excluded.updated_at
                WHERE media_entities.payload != excluded.payload
                   OR media_entities.title != excluded.title
                ",
            )
            .bind(page_id)
            .bind(&entity.title)
            .bind(&payload)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .map_err(storage)?
            .rows_affected();

            if written > 0 || !displaced.is_empty() {
                change.page_ids.push(entity.page_id);
                change
                    .page_ids
                    .extend(displaced.into_iter().filter_map(|id| u64::try_from(id).ok()));
                change.titles.push(entity.title.clone());
                if let Some(old) = previous_title.filter(|old| *old != entity.title) {
                    change.titles.push(old);
                }
            }
        }

        tx.commit().await.map_err(storage)?;

        if change.page_ids.is_empty() {
            debug!(count = entities.len(), "Upsert was a no-op");
        } else {
            debug!(changed = change.page_ids.len(), "Upserted media entities");
            self.publish(change);
        }
        Ok(())
    }

    async fn fetch(&self, ids: &[Identifier]) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        fetch_annotated(&self.pool, ids).await
    }

    fn live_query(&self, ids: Vec<Identifier>) -> SnapshotStream {
        let pool = self.pool.clone();
        // Subscribe before the first read so no commit can slip in between.
        let mut changes = self.changes.subscribe();

        Box::pin(stream! {
            let mut known: HashSet<u64> = HashSet::new();
            let mut refresh = true;
            loop {
                if refresh {
                    match fetch_annotated(&pool, &ids).await {
                        Ok(snapshot) => {
                            known = snapshot.iter().map(|a| a.entity.page_id).collect();
                            yield Ok(snapshot);
                        }
                        Err(e) => {
                            yield Err(e);
                        }
                    }
                }
                refresh = match changes.recv().await {
                    Ok(change) => change.touches(&ids, &known),
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "Live query lagged, re-reading");
                        true
                    }
                    Err(RecvError::Closed) => break,
                };
            }
        })
    }

    async fn set_bookmark(&self, page_id: u64, bookmarked: bool) -> Result<(), RepositoryError> {
        self.upsert_annotation(
            page_id,
            r"
            INSERT INTO annotations (page_id, bookmarked, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                bookmarked = excluded.bookmarked,
                updated_at = excluded.updated_at
            ",
            AnnotationBind::Bookmarked(bookmarked),
        )
        .await
    }

    async fn record_view(&self, page_id: u64, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        self.upsert_annotation(
            page_id,
            r"
            INSERT INTO annotations (page_id, last_viewed_at, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(page_id) DO UPDATE SET
                last_viewed_at = excluded.last_viewed_at,
                updated_at = excluded.updated_at
            ",
            AnnotationBind::ViewedAt(at),
        )
        .await
    }

    async fn bookmarks(&self) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        let sql = format!("{ANNOTATED_SELECT} WHERE a.bookmarked = 1 ORDER BY a.updated_at DESC");
        self.query_annotated(&sql, None).await
    }

    async fn recently_viewed(&self, limit: u32) -> Result<Vec<AnnotatedEntity>, RepositoryError> {
        let sql = format!(
            "{ANNOTATED_SELECT} WHERE a.last_viewed_at IS NOT NULL \
             ORDER BY a.last_viewed_at DESC LIMIT ?"
        );
        self.query_annotated(&sql, Some(limit)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::setup_test_database;
    use chrono::TimeZone;
    use futures_util::StreamExt;
    use std::time::Duration;

    async fn store() -> SqliteMediaStore {
        SqliteMediaStore::new(setup_test_database().await.unwrap())
    }

    fn entity(page_id: u64, title: &str) -> MediaEntity {
        MediaEntity::new(page_id, title)
    }

    #[tokio::test]
    async fn test_upsert_and_fetch_in_request_order() {
        let store = store().await;
        store
            .upsert(&[entity(1, "File:A.jpg"), entity(2, "File:B.jpg")])
            .await
            .unwrap();

        let fetched = store
            .fetch(&[
                Identifier::title("File:B.jpg"),
                Identifier::title("File:Missing.jpg"),
                Identifier::title("File:A.jpg"),
            ])
            .await
            .unwrap();

        let titles: Vec<_> = fetched.iter().map(|a| a.entity.title.as_str()).collect();
        assert_eq!(titles, vec!["File:B.jpg", "File:A.jpg"]);
        assert!(fetched.iter().all(|a| a.annotation.is_none()));
    }

    #[tokio::test]
    async fn test_fetch_by_page_id() {
        let store = store().await;
        store.upsert(&[entity(7, "File:G.jpg")]).await.unwrap();

        let fetched = store.fetch(&[Identifier::page_id(7)]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].entity.title, "File:G.jpg");
    }

    #[tokio::test]
    async fn test_fetch_many_mixed_ids_keeps_order() {
        let store = store().await;
        let entities: Vec<MediaEntity> = (1..=1200)
            .map(|n| entity(n, &format!("File:{n}.jpg")))
            .collect();
        store.upsert(&entities).await.unwrap();

        // Reverse order, alternating id kinds, each page requested twice.
        let mut ids = Vec::new();
        for n in (1..=1200u64).rev() {
            ids.push(if n % 2 == 0 {
                Identifier::page_id(n)
            } else {
                Identifier::title(format!("File:{n}.jpg"))
            });
        }
        ids.push(Identifier::title("File:1200.jpg"));
        ids.push(Identifier::page_id(1));

        let fetched = store.fetch(&ids).await.unwrap();

        let pages: Vec<u64> = fetched.iter().map(|a| a.entity.page_id).collect();
        let expected: Vec<u64> = (1..=1200u64).rev().collect();
        assert_eq!(pages, expected);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_and_updates() {
        let store = store().await;
        let mut cat = entity(1, "File:Cat.jpg");
        store.upsert(&[cat.clone()]).await.unwrap();
        store.upsert(&[cat.clone()]).await.unwrap();

        cat.width = Some(640);
        store.upsert(&[cat]).await.unwrap();

        let fetched = store.fetch(&[Identifier::page_id(1)]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].entity.width, Some(640));
    }

    #[tokio::test]
    async fn test_title_moves_to_newer_page() {
        let store = store().await;
        store.upsert(&[entity(1, "File:Cat.jpg")]).await.unwrap();
        store.upsert(&[entity(2, "File:Cat.jpg")]).await.unwrap();

        let fetched = store.fetch(&[Identifier::title("File:Cat.jpg")]).await.unwrap();
        assert_eq!(fetched[0].entity.page_id, 2);
        assert!(store.fetch(&[Identifier::page_id(1)]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bookmarks_and_recent_views() {
        let store = store().await;
        store
            .upsert(&[entity(1, "File:A.jpg"), entity(2, "File:B.jpg")])
            .await
            .unwrap();

        store.set_bookmark(2, true).await.unwrap();
        let bookmarks = store.bookmarks().await.unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert!(bookmarks[0].is_bookmarked());

        store.set_bookmark(2, false).await.unwrap();
        assert!(store.bookmarks().await.unwrap().is_empty());

        let earlier = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        store.record_view(1, earlier).await.unwrap();
        store.record_view(2, later).await.unwrap();

        let recent = store.recently_viewed(10).await.unwrap();
        let ids: Vec<u64> = recent.iter().map(|a| a.entity.page_id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(recent[0].annotation.as_ref().unwrap().last_viewed_at, Some(later));

        assert_eq!(store.recently_viewed(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_live_query_emits_initial_and_changes() {
        let store = store().await;
        store.upsert(&[entity(1, "File:A.jpg")]).await.unwrap();

        let ids = vec![Identifier::title("File:A.jpg"), Identifier::title("File:B.jpg")];
        let mut live = store.live_query(ids);

        let first = live.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store.upsert(&[entity(2, "File:B.jpg")]).await.unwrap();
        let second = live.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);

        store.set_bookmark(1, true).await.unwrap();
        let third = live.next().await.unwrap().unwrap();
        assert!(third[0].is_bookmarked());
    }

    #[tokio::test]
    async fn test_live_query_ignores_unrelated_and_noop_writes() {
        let store = store().await;
        store.upsert(&[entity(1, "File:A.jpg")]).await.unwrap();

        let mut live = store.live_query(vec![Identifier::page_id(1)]);
        live.next().await.unwrap().unwrap();

        store.upsert(&[entity(1, "File:A.jpg")]).await.unwrap();
        store.upsert(&[entity(9, "File:Other.jpg")]).await.unwrap();

        let pending = tokio::time::timeout(Duration::from_millis(50), live.next()).await;
        assert!(pending.is_err(), "no snapshot expected for unrelated writes");
    }

    #[tokio::test]
    async fn test_live_query_ends_when_store_dropped() {
        let store = store().await;
        let mut live = store.live_query(vec![Identifier::page_id(1)]);
        assert!(live.next().await.unwrap().unwrap().is_empty());

        drop(store);
        assert!(live.next().await.is_none());
    }
}
