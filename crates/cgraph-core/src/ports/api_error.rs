//! Error types for remote API port operations.

use thiserror::Error;

/// Errors from remote list, entity and label operations.
///
/// These are domain-level errors that consumers can handle.
/// Implementation-specific errors (HTTP, JSON) are mapped to these.
#[derive(Debug, Clone, Error)]
pub enum ApiPortError {
    /// The requested page or entity does not exist.
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// The remote asked us to slow down (HTTP 429 or replication lag).
    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    /// Network or connectivity error.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error
        message: String,
    },

    /// The API answered with an error object.
    #[error("API error '{code}': {info}")]
    Api {
        /// Machine-readable error code
        code: String,
        /// Human-readable description
        info: String,
    },

    /// Invalid response from the API.
    #[error("Invalid API response: {message}")]
    InvalidResponse {
        /// What was invalid
        message: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration {
        /// What's wrong with the configuration
        message: String,
    },
}

/// Result type alias for remote API port operations.
pub type ApiPortResult<T> = Result<T, ApiPortError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ApiPortError::Api {
            code: "maxlag".to_string(),
            info: "Waiting for db: 6 seconds lagged".to_string(),
        };
        assert!(err.to_string().contains("maxlag"));

        let err = ApiPortError::NotFound {
            what: "File:Nope.jpg".to_string(),
        };
        assert!(err.to_string().contains("File:Nope.jpg"));
    }
}
