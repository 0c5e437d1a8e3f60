//! Keeps the in-memory result list in step with the local store.

use std::sync::Arc;

use cgraph_core::{AnnotatedEntity, Identifier, MediaStorePort};
use futures_util::StreamExt;
use indexmap::IndexMap;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// A running live-query subscription.
struct Subscription {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    len: usize,
}

/// Owns at most one live-query subscription at a time.
///
/// [`observe`](Self::observe) replaces the previous subscription, so the
/// callback only ever sees snapshots for the latest id set.
pub struct ReconciliationObserver {
    store: Arc<dyn MediaStorePort>,
    handle: Handle,
    subscription: Option<Subscription>,
}

impl ReconciliationObserver {
    pub fn new(store: Arc<dyn MediaStorePort>, handle: Handle) -> Self {
        Self {
            store,
            handle,
            subscription: None,
        }
    }

    /// Subscribe to `ids`, calling `on_snapshot` with every snapshot.
    ///
    /// Any previous subscription is stopped first. Stream errors are logged
    /// and the subscription keeps listening.
    pub fn observe<F>(&mut self, ids: Vec<Identifier>, mut on_snapshot: F)
    where
        F: FnMut(Vec<AnnotatedEntity>) + Send + 'static,
    {
        self.stop();

        let len = ids.len();
        let mut snapshots = self.store.live_query(ids);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = self.handle.spawn(async move {
            loop {
                tokio::select! {
                    biased;

                    () = token.cancelled() => break,

                    next = snapshots.next() => match next {
                        Some(Ok(snapshot)) => on_snapshot(snapshot),
                        Some(Err(e)) => warn!(error = %e, "Live query failed"),
                        None => {
                            debug!("Live query ended");
                            break;
                        }
                    },
                }
            }
        });

        debug!(count = len, "Observing result ids");
        self.subscription = Some(Subscription { cancel, task, len });
    }

    /// Stop the current subscription, if any.
    pub fn stop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel.cancel();
            subscription.task.abort();
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| !s.task.is_finished())
    }

    /// Number of ids the current subscription covers, 0 when stopped.
    pub fn observed_len(&self) -> usize {
        self.subscription.as_ref().map_or(0, |s| s.len)
    }
}

impl Drop for ReconciliationObserver {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Splice a snapshot into `entries`, matching by page id.
///
/// Entries absent from the snapshot are left alone, snapshot rows with no
/// entry are ignored, and the order of `entries` never changes. Returns
/// whether anything was replaced.
pub fn reconcile(
    entries: &mut IndexMap<u64, AnnotatedEntity>,
    snapshot: Vec<AnnotatedEntity>,
) -> bool {
    let mut changed = false;
    for fresh in snapshot {
        if let Some(entry) = entries.get_mut(&fresh.entity.page_id) {
            if *entry != fresh {
                *entry = fresh;
                changed = true;
            }
        }
    }
    changed
}
