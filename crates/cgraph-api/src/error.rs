//! Internal error types for API operations.
//!
//! These errors are internal to `cgraph-api` and are mapped to core port errors
//! at the boundary.

use thiserror::Error;

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors related to MediaWiki / Wikibase API operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// API request failed with an HTTP error status.
    #[error("API request failed with status {status}: {url}")]
    RequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// HTTP 429 after all retries.
    #[error("Rate limited by {url}")]
    RateLimited {
        /// The URL that was requested
        url: String,
    },

    /// The API returned an `error` object in an otherwise successful response.
    #[error("API error '{code}': {info}")]
    Api {
        /// Machine-readable code, e.g. `maxlag`
        code: String,
        /// Human-readable description
        info: String,
    },

    /// API returned an invalid or unexpected response.
    #[error("Invalid response from API: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// Client could not be configured.
    #[error("Invalid client configuration: {message}")]
    Configuration {
        /// What is wrong
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_failed_error_message() {
        let error = ApiError::RequestFailed {
            status: 503,
            url: "https://commons.wikimedia.org/w/api.php".to_string(),
        };
        let msg = error.to_string();
        assert!(msg.contains("503"));
        assert!(msg.contains("commons.wikimedia.org"));
    }

    #[test]
    fn test_api_error_message() {
        let error = ApiError::Api {
            code: "badvalue".to_string(),
            info: "Unrecognized value for parameter \"list\"".to_string(),
        };
        assert!(error.to_string().contains("badvalue"));
    }
}
