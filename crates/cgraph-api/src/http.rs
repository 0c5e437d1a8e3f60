//! HTTP backend abstraction for the Wikimedia APIs.
//!
//! The client talks to the network only through [`HttpBackend`], so tests can
//! swap in [`testing::FakeBackend`]. The production backend retries transient
//! failures with exponential backoff.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::models::ApiConfig;

/// Upper bound on a server-supplied `Retry-After`.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

/// Upper bound for the exponential backoff delay.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can fetch JSON from URLs.
///
/// This is an implementation detail; external code goes through the core
/// port traits.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Fetch JSON from a URL and deserialize it.
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> ApiResult<T>;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest.
///
/// Retries server errors (5xx), rate limiting (429) and network errors.
/// A 429 with a `Retry-After` header waits for the advertised duration
/// instead of the backoff delay.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay_ms: u64,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base_delay_ms: config.retry_base_delay_ms,
        })
    }

    fn backoff(&self, attempt: u8) -> Duration {
        let delay_ms = 2u64
            .checked_pow(u32::from(attempt))
            .and_then(|factor| self.retry_base_delay_ms.checked_mul(factor))
            .unwrap_or(u64::MAX);
        Duration::from_millis(delay_ms).min(MAX_BACKOFF)
    }

    /// Fetch a URL with automatic retry for transient errors.
    async fn fetch_with_retry(&self, url: &Url) -> ApiResult<reqwest::Response> {
        let mut attempt: u8 = 0;

        loop {
            let outcome = self.client.get(url.as_str()).send().await;
            let retries_left = attempt < self.max_retries;

            let delay = match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if !retries_left {
                            return Err(ApiError::RateLimited {
                                url: url.to_string(),
                            });
                        }
                        retry_after(&response).unwrap_or_else(|| self.backoff(attempt))
                    } else if status.is_server_error() && retries_left {
                        self.backoff(attempt)
                    } else {
                        return Err(ApiError::RequestFailed {
                            status: status.as_u16(),
                            url: url.to_string(),
                        });
                    }
                }
                Err(e) => {
                    if !retries_left {
                        return Err(e.into());
                    }
                    debug!(error = %e, "Network error, will retry");
                    self.backoff(attempt)
                }
            };

            attempt += 1;
            warn!(
                url = %url,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "Retrying API request"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let seconds = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> ApiResult<T> {
        let response = self.fetch_with_retry(url).await?;
        let data: T = response.json().await?;
        Ok(data)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Canned response for the fake backend.
    #[derive(Clone)]
    pub enum CannedResponse {
        Json(serde_json::Value),
        Status(u16),
    }

    impl From<serde_json::Value> for CannedResponse {
        fn from(json: serde_json::Value) -> Self {
            Self::Json(json)
        }
    }

    struct Route {
        pattern: String,
        responses: VecDeque<CannedResponse>,
    }

    /// A fake HTTP backend that returns canned responses.
    ///
    /// Routes are matched in insertion order by URL substring. A route with
    /// several responses serves them in sequence and then repeats the last.
    #[derive(Clone, Default)]
    pub struct FakeBackend {
        routes: Arc<Mutex<Vec<Route>>>,
        requests: Arc<Mutex<Vec<String>>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a canned response for a URL pattern.
        pub fn with_response(self, url_contains: &str, response: impl Into<CannedResponse>) -> Self {
            {
                let mut routes = self.routes.lock().unwrap();
                let response = response.into();
                if let Some(route) = routes.iter_mut().find(|r| r.pattern == url_contains) {
                    route.responses.push_back(response);
                } else {
                    routes.push(Route {
                        pattern: url_contains.to_string(),
                        responses: VecDeque::from([response]),
                    });
                }
            }
            self
        }

        /// Every URL requested so far.
        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        /// Number of requests whose URL contains `pattern`.
        pub fn count(&self, pattern: &str) -> usize {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|url| url.contains(pattern))
                .count()
        }

        fn find_response(&self, url: &str) -> Option<CannedResponse> {
            let mut routes = self.routes.lock().unwrap();
            let route = routes.iter_mut().find(|r| url.contains(&r.pattern))?;
            if route.responses.len() > 1 {
                route.responses.pop_front()
            } else {
                route.responses.front().cloned()
            }
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_json<T: DeserializeOwned + Send>(&self, url: &Url) -> ApiResult<T> {
            self.requests.lock().unwrap().push(url.to_string());
            match self.find_response(url.as_str()) {
                Some(CannedResponse::Json(json)) => serde_json::from_value(json).map_err(Into::into),
                Some(CannedResponse::Status(429)) => Err(ApiError::RateLimited {
                    url: url.to_string(),
                }),
                Some(CannedResponse::Status(status)) => Err(ApiError::RequestFailed {
                    status,
                    url: url.to_string(),
                }),
                None => Err(ApiError::RequestFailed {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reqwest_backend_creation() {
        let config = ApiConfig::default();
        let backend = ReqwestBackend::new(&config).unwrap();
        assert_eq!(backend.max_retries, 3);
        assert_eq!(backend.retry_base_delay_ms, 500);
    }

    #[test]
    fn test_backoff_doubles() {
        let backend = ReqwestBackend::new(&ApiConfig::default()).unwrap();
        assert_eq!(backend.backoff(0), Duration::from_millis(500));
        assert_eq!(backend.backoff(1), Duration::from_millis(1000));
        assert_eq!(backend.backoff(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_saturates_at_cap() {
        let config = ApiConfig {
            max_retries: u8::MAX,
            retry_base_delay_ms: u64::MAX,
            ..ApiConfig::default()
        };
        let backend = ReqwestBackend::new(&config).unwrap();
        assert_eq!(backend.backoff(0), MAX_BACKOFF);
        assert_eq!(backend.backoff(u8::MAX), MAX_BACKOFF);

        let backend = ReqwestBackend::new(&ApiConfig::default()).unwrap();
        assert_eq!(backend.backoff(200), MAX_BACKOFF);
    }

    #[tokio::test]
    async fn test_fake_backend_returns_canned_response() {
        let backend = FakeBackend::new().with_response("list=categorymembers", json!({"ok": 1}));

        let url = Url::parse("https://example.org/w/api.php?list=categorymembers").unwrap();
        let result: serde_json::Value = backend.get_json(&url).await.unwrap();

        assert_eq!(result["ok"], 1);
        assert_eq!(backend.count("categorymembers"), 1);
    }

    #[tokio::test]
    async fn test_fake_backend_serves_sequence() {
        let backend = FakeBackend::new()
            .with_response("api.php", json!({"n": 1}))
            .with_response("api.php", json!({"n": 2}));
        let url = Url::parse("https://example.org/w/api.php").unwrap();

        let first: serde_json::Value = backend.get_json(&url).await.unwrap();
        let second: serde_json::Value = backend.get_json(&url).await.unwrap();
        let third: serde_json::Value = backend.get_json(&url).await.unwrap();

        assert_eq!(first["n"], 1);
        assert_eq!(second["n"], 2);
        assert_eq!(third["n"], 2);
    }

    #[tokio::test]
    async fn test_fake_backend_returns_404_for_unknown_url() {
        let backend = FakeBackend::new();
        let url = Url::parse("https://example.org/unknown").unwrap();

        let result: ApiResult<serde_json::Value> = backend.get_json(&url).await;
        assert!(matches!(
            result,
            Err(ApiError::RequestFailed { status: 404, .. })
        ));
    }
}
