//! Batch resolution of identifiers into persisted entities.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use cgraph_core::{EntityResolverPort, IdKind, Identifier, MediaEntity, MediaStorePort};
use tracing::{debug, warn};

use crate::error::{PagingError, PagingResult};

/// Resolves identifiers through the remote entity API and upserts them.
#[derive(Clone)]
pub struct BatchResolver {
    api: Arc<dyn EntityResolverPort>,
    store: Arc<dyn MediaStorePort>,
    kind: IdKind,
}

impl BatchResolver {
    pub fn new(
        api: Arc<dyn EntityResolverPort>,
        store: Arc<dyn MediaStorePort>,
        kind: IdKind,
    ) -> Self {
        Self { api, store, kind }
    }

    pub const fn kind(&self) -> IdKind {
        self.kind
    }

    /// Fail on the first identifier that is not of this resolver's kind.
    pub fn check_kind(&self, ids: &[Identifier]) -> PagingResult<()> {
        match ids.iter().find(|id| id.kind() != self.kind) {
            Some(id) => Err(PagingError::KindMismatch {
                expected: self.kind,
                found: id.kind(),
            }),
            None => Ok(()),
        }
    }

    /// Resolve `ids` and persist the result in one store transaction.
    ///
    /// Entities come back in request order. Ids the remote has no entity
    /// for are logged and dropped. Two ids resolving to the same page
    /// yield one entity.
    ///
    /// # Errors
    ///
    /// [`PagingError::KindMismatch`] before any network call when a request
    /// id has the wrong kind, or when the remote keys a result by the wrong
    /// kind. Otherwise the first remote or store failure. Nothing is written
    /// when the remote fails.
    pub async fn resolve(&self, ids: &[Identifier]) -> PagingResult<Vec<MediaEntity>> {
        self.check_kind(ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let chunk_size = self.api.max_batch().max(1);
        let mut by_request: HashMap<Identifier, MediaEntity> = HashMap::with_capacity(ids.len());
        for chunk in ids.chunks(chunk_size) {
            for resolved in self.api.resolve(chunk).await? {
                let found = resolved.requested.kind();
                if found != self.kind {
                    return Err(PagingError::KindMismatch {
                        expected: self.kind,
                        found,
                    });
                }
                by_request.insert(resolved.requested, resolved.entity);
            }
        }

        let mut pages = HashSet::with_capacity(ids.len());
        let mut entities = Vec::with_capacity(ids.len());
        for id in ids {
            match by_request.remove(id) {
                Some(entity) => {
                    if pages.insert(entity.page_id) {
                        entities.push(entity);
                    }
                }
                None => warn!(id = %id, "No entity for identifier, dropping"),
            }
        }

        if !entities.is_empty() {
            self.store.upsert(&entities).await?;
        }
        debug!(
            requested = ids.len(),
            resolved = entities.len(),
            "Resolved batch"
        );
        Ok(entities)
    }
}
