//! Port implementations for `ApiClient`.
//!
//! Implements the core-owned entity and label ports and maps internal
//! errors onto [`ApiPortError`].

use std::collections::HashMap;

use async_trait::async_trait;
use cgraph_core::{
    ApiPortError, ApiPortResult, EntityResolverPort, Identifier, LabelResolverPort, MAX_ENTITY_BATCH,
    ResolvedEntity,
};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::HttpBackend;

/// API error codes that mean "slow down".
const THROTTLE_CODES: &[&str] = &["maxlag", "ratelimited"];

// ============================================================================
// Error Mapping
// ============================================================================

/// Convert internal `ApiError` to core `ApiPortError`.
pub(crate) fn map_error(err: ApiError) -> ApiPortError {
    match err {
        ApiError::RequestFailed { status, url } => match status {
            404 => ApiPortError::NotFound { what: url },
            429 => ApiPortError::RateLimited,
            _ => ApiPortError::Network {
                message: format!("API request failed with status {status}: {url}"),
            },
        },
        ApiError::RateLimited { .. } => ApiPortError::RateLimited,
        ApiError::Api { code, .. } if THROTTLE_CODES.contains(&code.as_str()) => {
            ApiPortError::RateLimited
        }
        ApiError::Api { code, info } => ApiPortError::Api { code, info },
        ApiError::InvalidResponse { message } => ApiPortError::InvalidResponse { message },
        ApiError::Configuration { message } => ApiPortError::Configuration { message },
        ApiError::Network(e) => ApiPortError::Network {
            message: e.to_string(),
        },
        ApiError::InvalidUrl(e) => ApiPortError::Configuration {
            message: e.to_string(),
        },
        ApiError::JsonParse(e) => ApiPortError::InvalidResponse {
            message: e.to_string(),
        },
    }
}

// ============================================================================
// Port Implementations
// ============================================================================

#[async_trait]
impl<B: HttpBackend> EntityResolverPort for ApiClient<B> {
    fn max_batch(&self) -> usize {
        MAX_ENTITY_BATCH
    }

    async fn resolve(&self, ids: &[Identifier]) -> ApiPortResult<Vec<ResolvedEntity>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.resolve_pages(ids).await.map_err(map_error)
    }
}

#[async_trait]
impl<B: HttpBackend> LabelResolverPort for ApiClient<B> {
    async fn resolve_labels(
        &self,
        entity_ids: &[String],
        language: &str,
    ) -> ApiPortResult<HashMap<String, String>> {
        if entity_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.fetch_labels(entity_ids, language)
            .await
            .map_err(map_error)
    }
}
