//! Internal configuration and raw response shapes.
//!
//! The response structs mirror the Action API with `formatversion=2` and are
//! only used for decoding; [`crate::parsing`] turns them into core types.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::ApiClientConfig;
use crate::error::{ApiError, ApiResult};

// ============================================================================
// Internal Configuration
// ============================================================================

/// Validated client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub commons_url: Url,
    pub wikidata_url: Url,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u8,
    pub retry_base_delay_ms: u64,
    pub page_limit: u32,
    pub thumbnail_width: u32,
    pub language: String,
    pub structured_data: bool,
    pub max_lag: u32,
}

impl ApiConfig {
    /// Validate the public configuration.
    pub fn from_public(config: &ApiClientConfig) -> ApiResult<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(ApiError::Configuration {
                message: "user agent must not be empty".to_string(),
            });
        }

        Ok(Self {
            commons_url: Url::parse(&config.commons_api_url)?,
            wikidata_url: Url::parse(&config.wikidata_api_url)?,
            user_agent: config.user_agent.clone(),
            timeout: config.timeout,
            max_retries: config.max_retries,
            retry_base_delay_ms: u64::try_from(config.retry_base_delay.as_millis())
                .unwrap_or(u64::MAX),
            page_limit: config.page_limit.clamp(1, 500),
            thumbnail_width: config.thumbnail_width,
            language: config.language.clone(),
            structured_data: config.structured_data,
            max_lag: config.max_lag,
        })
    }
}

#[cfg(test)]
impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_public(&ApiClientConfig::default()).unwrap()
    }
}

// ============================================================================
// Response Envelope
// ============================================================================

/// Top-level shape shared by every `action=query` response.
#[derive(Debug, Deserialize)]
pub struct QueryResponse<Q> {
    /// Parameters for the next page, absent on the last page.
    #[serde(rename = "continue")]
    pub continuation: Option<BTreeMap<String, Value>>,
    pub query: Option<Q>,
}

/// `{"error": {"code": ..., "info": ...}}`
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    #[serde(default)]
    pub info: String,
}

// ============================================================================
// Lists
// ============================================================================

/// One row of `list=categorymembers` or `list=search`.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRef {
    pub pageid: Option<u64>,
    #[serde(default)]
    pub ns: i32,
    pub title: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryMembersQuery {
    #[serde(default)]
    pub categorymembers: Vec<PageRef>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Vec<PageRef>,
}

// ============================================================================
// Pages
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct Normalized {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagesQuery {
    #[serde(default)]
    pub normalized: Vec<Normalized>,
    #[serde(default)]
    pub pages: Vec<RawPage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPage {
    pub pageid: Option<u64>,
    pub title: Option<String>,
    #[serde(default)]
    pub missing: bool,
    #[serde(default)]
    pub invalid: bool,
    #[serde(default)]
    pub imageinfo: Vec<RawImageInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawImageInfo {
    pub timestamp: Option<String>,
    pub user: Option<String>,
    pub size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub url: Option<String>,
    pub thumburl: Option<String>,
    pub mime: Option<String>,
    #[serde(default)]
    pub extmetadata: HashMap<String, ExtMetadataField>,
}

/// `extmetadata` values are usually strings but can be numbers.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtMetadataField {
    pub value: Value,
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct EntitiesResponse {
    #[serde(default)]
    pub entities: HashMap<String, RawEntity>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawEntity {
    pub id: Option<String>,
    /// Present (usually as `""`) when the entity does not exist.
    pub missing: Option<Value>,
    #[serde(default)]
    pub labels: HashMap<String, LabelValue>,
    /// `MediaInfo` entities use `statements`, items use `claims`.
    pub statements: Option<Value>,
    pub claims: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LabelValue {
    pub value: String,
}
