//! Error types for gavel-ai

use std::time::Duration;
use thiserror::Error;

/// Result type alias using gavel-ai Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when calling an agent
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Agent service returned a non-success status
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    /// Agent reported a failure in its response body
    #[error("Agent error: {0}")]
    Agent(String),

    /// Agent did not answer within the adapter's timeout
    #[error("Agent timed out after {0:?}")]
    Timeout(Duration),

    /// Response did not have the expected shape
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Http(e) => e.is_timeout(),
            Error::Api { status, .. } => *status == 408 || *status == 504,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_variant() {
        assert!(Error::Timeout(Duration::from_secs(30)).is_timeout());
    }

    #[test]
    fn test_gateway_timeout_status() {
        assert!(Error::api(504, "upstream timed out").is_timeout());
        assert!(Error::api(408, "request timeout").is_timeout());
    }

    #[test]
    fn test_not_timeout() {
        assert!(!Error::api(500, "boom").is_timeout());
        assert!(!Error::Agent("cannot reach catalogue".into()).is_timeout());
        assert!(!Error::UnexpectedResponse("no message".into()).is_timeout());
    }

    #[test]
    fn test_display() {
        let e = Error::api(502, "bad gateway");
        assert_eq!(e.to_string(), "API error: bad gateway (status: 502)");
        let e = Error::Agent("database offline".into());
        assert_eq!(e.to_string(), "Agent error: database offline");
    }
}
