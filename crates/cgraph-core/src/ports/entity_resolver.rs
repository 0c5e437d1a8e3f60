//! Remote entity port: batch resolution of identifiers.

use async_trait::async_trait;

use super::api_error::ApiPortResult;
use crate::domain::{Identifier, MediaEntity};

/// Largest batch the remote entity API accepts in one request.
pub const MAX_ENTITY_BATCH: usize = 50;

/// A resolved entity paired with the identifier it was requested as.
///
/// The remote may normalize titles, so the requested id is kept alongside
/// the canonical entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub requested: Identifier,
    pub entity: MediaEntity,
}

/// Port trait for resolving batches of identifiers into entities.
///
/// # Contract
///
/// - `ids` never exceeds [`max_batch`](Self::max_batch); callers pre-chunk
/// - ids with no corresponding entity are simply absent from the result
#[async_trait]
pub trait EntityResolverPort: Send + Sync {
    /// Maximum ids per call.
    fn max_batch(&self) -> usize {
        MAX_ENTITY_BATCH
    }

    /// Resolve a batch of identifiers of a single kind.
    async fn resolve(&self, ids: &[Identifier]) -> ApiPortResult<Vec<ResolvedEntity>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn _assert_object_safe(_: Arc<dyn EntityResolverPort>) {}
}
