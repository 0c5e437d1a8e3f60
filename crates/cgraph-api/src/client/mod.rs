//! Client for the media repository and knowledge-graph APIs.

mod labels;
mod lists;
mod media;

use cgraph_core::ApiPortError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::config::ApiClientConfig;
use crate::error::ApiResult;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::ApiConfig;
use crate::parsing::check_api_error;
use crate::port::map_error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default client using the reqwest HTTP backend.
pub type DefaultApiClient = ApiClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the MediaWiki Action API and the Wikibase API.
///
/// Generic over an HTTP backend so tests can inject a fake. Production code
/// uses [`DefaultApiClient::new`] and talks to the client through the core
/// port traits.
pub struct ApiClient<B: HttpBackend> {
    pub(crate) backend: B,
    pub(crate) config: ApiConfig,
}

impl DefaultApiClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiPortError::Configuration`] for unparsable endpoints or an
    /// empty user agent, and [`ApiPortError::Network`] if the HTTP client
    /// cannot be built.
    pub fn new(config: &ApiClientConfig) -> Result<Self, ApiPortError> {
        let config = ApiConfig::from_public(config).map_err(map_error)?;
        let backend = ReqwestBackend::new(&config).map_err(map_error)?;
        Ok(Self { backend, config })
    }

    /// Create a new client with default configuration.
    ///
    /// # Errors
    ///
    /// See [`DefaultApiClient::new`].
    pub fn default_client() -> Result<Self, ApiPortError> {
        Self::new(&ApiClientConfig::default())
    }
}

impl<B: HttpBackend> ApiClient<B> {
    /// Create a new client with a custom backend.
    #[cfg(test)]
    pub(crate) const fn with_backend(config: ApiConfig, backend: B) -> Self {
        Self { backend, config }
    }

    /// Language used for descriptions and labels.
    pub fn language(&self) -> &str {
        &self.config.language
    }

    /// Fetch an API response, surfacing `error` objects as errors.
    pub(crate) async fn get_action<T: DeserializeOwned + Send>(&self, url: &Url) -> ApiResult<T> {
        let json: Value = self.backend.get_json(url).await?;
        check_api_error(&json)?;
        Ok(serde_json::from_value(json)?)
    }
}
