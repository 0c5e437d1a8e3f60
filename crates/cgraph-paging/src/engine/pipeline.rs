//! One pagination round: refill, select, resolve, drain.
//!
//! The pipeline owns every cursor and queue. It is driven by exactly one
//! round at a time; the engine enforces that.

use cgraph_core::{Identifier, MediaEntity};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::cursor::ContinuationCursor;
use crate::error::PagingResult;
use crate::fetcher::SourceFetcher;
use crate::queue::DeduplicatingIdQueue;
use crate::resolver::BatchResolver;

/// Per-source pagination state.
pub(crate) struct SourceState {
    fetcher: SourceFetcher,
    cursor: ContinuationCursor,
    queue: DeduplicatingIdQueue,
}

impl SourceState {
    fn new(fetcher: SourceFetcher) -> Self {
        Self {
            fetcher,
            cursor: ContinuationCursor::start(),
            queue: DeduplicatingIdQueue::new(),
        }
    }
}

/// What a finished round produced.
#[derive(Debug, Default)]
pub(crate) struct RoundOutcome {
    /// Newly resolved entities, in request order.
    pub entities: Vec<MediaEntity>,
    /// Every cursor is terminal and every queue is empty.
    pub reached_end: bool,
}

pub(crate) struct Pipeline {
    sources: Vec<SourceState>,
    resolver: BatchResolver,
    batch_size: usize,
}

impl Pipeline {
    pub fn new(fetchers: Vec<SourceFetcher>, resolver: BatchResolver, batch_size: usize) -> Self {
        Self {
            sources: fetchers.into_iter().map(SourceState::new).collect(),
            resolver,
            batch_size: batch_size.max(1),
        }
    }

    /// Run one round for `term`.
    ///
    /// Selected ids leave their queues only once they are resolved and
    /// persisted, so a failed or abandoned round can simply be retried.
    pub async fn advance(&mut self, term: &str) -> PagingResult<RoundOutcome> {
        self.refill(term).await;

        let heads: Vec<Vec<Identifier>> = self
            .sources
            .iter()
            .map(|source| source.queue.peek_first(self.batch_size))
            .collect();
        let (selected, taken) = interleave(&heads, self.batch_size);

        if selected.is_empty() {
            let reached_end = self.exhausted();
            debug!(reached_end, "Nothing pending after refill");
            return Ok(RoundOutcome {
                entities: Vec::new(),
                reached_end,
            });
        }

        let entities = self.resolver.resolve(&selected).await?;

        for (source, count) in self.sources.iter_mut().zip(taken) {
            source.queue.pop_first(count);
        }

        Ok(RoundOutcome {
            entities,
            reached_end: self.exhausted(),
        })
    }

    /// Fetch the next page of every low source concurrently, then commit
    /// each success independently.
    async fn refill(&mut self, term: &str) {
        let batch_size = self.batch_size;
        let fetches = self
            .sources
            .iter()
            .enumerate()
            .filter(|(_, source)| {
                source.cursor.can_continue() && source.queue.pending_len() < batch_size
            })
            .map(|(index, source)| async move {
                let outcome = source
                    .fetcher
                    .fetch(term, &source.cursor, source.queue.seen())
                    .await;
                (index, outcome)
            });
        let results = join_all(fetches).await;

        for (index, result) in results {
            match result {
                Ok(outcome) => {
                    // Drop ids another source already queued.
                    let fresh: Vec<Identifier> = outcome
                        .new_ids
                        .into_iter()
                        .filter(|id| {
                            !self
                                .sources
                                .iter()
                                .enumerate()
                                .any(|(other, source)| other != index && source.queue.contains(id))
                        })
                        .collect();

                    let source = &mut self.sources[index];
                    let accepted = source.queue.push(fresh);
                    source.cursor = outcome.next_cursor;
                    debug!(
                        source = %source.fetcher.name(),
                        accepted,
                        pending = source.queue.pending_len(),
                        more = source.cursor.can_continue(),
                        "Committed list page"
                    );
                }
                Err(e) => warn!(
                    source = %self.sources[index].fetcher.name(),
                    error = %e,
                    "List fetch failed, will retry on next round"
                ),
            }
        }
    }

    /// Whether no source can produce anything more.
    pub fn exhausted(&self) -> bool {
        self.sources
            .iter()
            .all(|source| !source.cursor.can_continue() && source.queue.is_empty())
    }

    #[cfg(test)]
    pub fn pending(&self) -> Vec<usize> {
        self.sources.iter().map(|s| s.queue.pending_len()).collect()
    }
}

/// Round-robin selection across queue heads.
///
/// Takes one id from each source in order, repeating until `limit` ids are
/// chosen or every head is used up. Returns the selection and how many ids
/// were taken from each source.
pub(crate) fn interleave(heads: &[Vec<Identifier>], limit: usize) -> (Vec<Identifier>, Vec<usize>) {
    let mut taken = vec![0; heads.len()];
    let mut selected = Vec::with_capacity(limit);

    while selected.len() < limit {
        let mut progressed = false;
        for (index, head) in heads.iter().enumerate() {
            if selected.len() == limit {
                break;
            }
            if let Some(id) = head.get(taken[index]) {
                selected.push(id.clone());
                taken[index] += 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }

    (selected, taken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeEntityResolver, FakeListSource, FakeStore};
    use cgraph_core::{ApiPortError, IdKind};
    use std::sync::Arc;

    fn ids(values: &[u64]) -> Vec<Identifier> {
        values.iter().copied().map(Identifier::page_id).collect()
    }

    fn pipeline(sources: Vec<Arc<FakeListSource>>, batch_size: usize) -> Pipeline {
        let store = Arc::new(FakeStore::new());
        let resolver = BatchResolver::new(Arc::new(FakeEntityResolver::new()), store, IdKind::PageId);
        let fetchers = sources
            .into_iter()
            .map(|s| SourceFetcher::new(s, IdKind::PageId))
            .collect();
        Pipeline::new(fetchers, resolver, batch_size)
    }

    #[test]
    fn test_interleave_balanced() {
        let (selected, taken) = interleave(&[ids(&[1, 2, 3]), ids(&[4, 5, 6])], 4);
        assert_eq!(selected, ids(&[1, 4, 2, 5]));
        assert_eq!(taken, vec![2, 2]);
    }

    #[test]
    fn test_interleave_fills_from_remaining_source() {
        let (selected, taken) = interleave(&[ids(&[1]), ids(&[4, 5, 6, 7])], 4);
        assert_eq!(selected, ids(&[1, 4, 5, 6]));
        assert_eq!(taken, vec![1, 3]);
    }

    #[test]
    fn test_interleave_empty() {
        let (selected, taken) = interleave(&[Vec::new(), Vec::new()], 4);
        assert!(selected.is_empty());
        assert_eq!(taken, vec![0, 0]);
    }

    #[tokio::test]
    async fn test_cross_source_duplicates_are_queued_once() {
        let a = Arc::new(FakeListSource::new("a").with_page(&["M1", "M2"], false));
        let b = Arc::new(FakeListSource::new("b").with_page(&["M2", "M3"], false));
        let mut pipeline = pipeline(vec![a, b], 10);

        let outcome = pipeline.advance("x").await.unwrap();

        let pages: Vec<u64> = outcome.entities.iter().map(|e| e.page_id).collect();
        assert_eq!(pages, vec![1, 3, 2]);
        assert!(outcome.reached_end);
    }

    #[tokio::test]
    async fn test_failed_source_keeps_its_cursor() {
        let a = Arc::new(
            FakeListSource::new("a")
                .with_page(&["M1"], false)
                .with_error(ApiPortError::RateLimited),
        );
        let b = Arc::new(FakeListSource::new("b").with_page(&["M2"], false));
        let mut pipeline = pipeline(vec![a.clone(), b.clone()], 10);

        let first = pipeline.advance("x").await.unwrap();
        assert_eq!(first.entities.len(), 1);
        assert!(!first.reached_end);

        let second = pipeline.advance("x").await.unwrap();
        assert_eq!(second.entities[0].page_id, 1);
        assert!(second.reached_end);
        assert_eq!(a.requested(), vec![0, 0]);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_resolve_failure_leaves_queues_untouched() {
        let a = Arc::new(FakeListSource::new("a").with_page(&["M1", "M2"], false));
        let store = Arc::new(FakeStore::new());
        let api = Arc::new(FakeEntityResolver::new().with_error(ApiPortError::RateLimited));
        let resolver = BatchResolver::new(api, store, IdKind::PageId);
        let mut pipeline = Pipeline::new(vec![SourceFetcher::new(a, IdKind::PageId)], resolver, 10);

        assert!(pipeline.advance("x").await.is_err());
        assert_eq!(pipeline.pending(), vec![2]);

        let retried = pipeline.advance("x").await.unwrap();
        assert_eq!(retried.entities.len(), 2);
        assert_eq!(pipeline.pending(), vec![0]);
    }
}
