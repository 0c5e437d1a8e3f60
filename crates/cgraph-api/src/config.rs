//! Public configuration for the API client.
//!
//! This module provides a stable public API for configuring the client.
//! The internal config is derived from this.

use std::time::Duration;

/// Configuration for the MediaWiki / Wikibase client.
///
/// Use the builder pattern methods to customize the client configuration.
///
/// # Example
///
/// ```
/// use cgraph_api::ApiClientConfig;
/// use std::time::Duration;
///
/// let config = ApiClientConfig::new()
///     .with_timeout(Duration::from_secs(60))
///     .with_user_agent("my-app/1.0 (me@example.org)")
///     .with_language("de");
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientConfig {
    /// Action API endpoint of the media repository
    pub(crate) commons_api_url: String,
    /// Action API endpoint of the knowledge graph
    pub(crate) wikidata_api_url: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Request timeout
    pub(crate) timeout: Duration,
    /// Maximum number of retry attempts for transient errors
    pub(crate) max_retries: u8,
    /// Base delay for exponential backoff
    pub(crate) retry_base_delay: Duration,
    /// Ids requested per list page
    pub(crate) page_limit: u32,
    /// Thumbnail width in pixels
    pub(crate) thumbnail_width: u32,
    /// Language for descriptions and labels
    pub(crate) language: String,
    /// Whether entity resolution also fetches structured-data statements
    pub(crate) structured_data: bool,
    /// `maxlag` parameter sent with every request (seconds)
    pub(crate) max_lag: u32,
}

impl Default for ApiClientConfig {
    fn default() -> Self {
        Self {
            commons_api_url: "https://commons.wikimedia.org/w/api.php".to_string(),
            wikidata_api_url: "https://www.wikidata.org/w/api.php".to_string(),
            user_agent: concat!("commonsgraph/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            page_limit: 50,
            thumbnail_width: 640,
            language: "en".to_string(),
            structured_data: true,
            max_lag: 5,
        }
    }
}

impl ApiClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the media repository API endpoint.
    ///
    /// Defaults to `https://commons.wikimedia.org/w/api.php`.
    #[must_use]
    pub fn with_commons_api_url(mut self, url: impl Into<String>) -> Self {
        self.commons_api_url = url.into();
        self
    }

    /// Set the knowledge graph API endpoint.
    ///
    /// Defaults to `https://www.wikidata.org/w/api.php`.
    #[must_use]
    pub fn with_wikidata_api_url(mut self, url: impl Into<String>) -> Self {
        self.wikidata_api_url = url.into();
        self
    }

    /// Set the user agent string for HTTP requests.
    ///
    /// Wikimedia APIs expect a descriptive agent with contact information.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    ///
    /// Defaults to 30 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retry attempts for transient errors.
    ///
    /// Defaults to 3 retries.
    #[must_use]
    pub const fn with_max_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the base delay for exponential backoff retries.
    ///
    /// Defaults to 500ms.
    #[must_use]
    pub const fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set how many ids each list page requests (clamped to 1..=500).
    #[must_use]
    pub const fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit;
        self
    }

    /// Set the thumbnail width requested during resolution.
    #[must_use]
    pub const fn with_thumbnail_width(mut self, width: u32) -> Self {
        self.thumbnail_width = width;
        self
    }

    /// Set the language used for descriptions and labels.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Enable or disable fetching structured-data statements.
    #[must_use]
    pub const fn with_structured_data(mut self, enabled: bool) -> Self {
        self.structured_data = enabled;
        self
    }

    /// Set the `maxlag` value sent with requests.
    #[must_use]
    pub const fn with_max_lag(mut self, seconds: u32) -> Self {
        self.max_lag = seconds;
        self
    }
}
