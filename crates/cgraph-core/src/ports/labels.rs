//! Knowledge-graph label ports.

use std::collections::HashMap;

use async_trait::async_trait;

use super::RepositoryError;
use super::api_error::ApiPortResult;
use super::entity_resolver::MAX_ENTITY_BATCH;

/// Port trait for resolving entity ids (e.g. `Q42`) to display labels.
#[async_trait]
pub trait LabelResolverPort: Send + Sync {
    /// Maximum ids per call.
    fn max_batch(&self) -> usize {
        MAX_ENTITY_BATCH
    }

    /// Resolve labels in `language`. Ids without a label are absent.
    async fn resolve_labels(
        &self,
        entity_ids: &[String],
        language: &str,
    ) -> ApiPortResult<HashMap<String, String>>;
}

/// Persistent label cache.
#[async_trait]
pub trait LabelRepository: Send + Sync {
    async fn get_labels(
        &self,
        entity_ids: &[String],
        language: &str,
    ) -> Result<HashMap<String, String>, RepositoryError>;

    async fn save_labels(
        &self,
        labels: &HashMap<String, String>,
        language: &str,
    ) -> Result<(), RepositoryError>;
}
