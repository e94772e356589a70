//! Error types for the Reel queue client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during one exchange with the queue
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connection refused, DNS, TLS, timeout...)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Queue answered with a non-success status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, if any
        message: String,
    },

    /// Response body was not the expected JSON
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Request could not be built (bad header name or value, bad URL)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if the failure happened before any response was received
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::RequestFailed(_))
    }

    /// Check if the response body could not be parsed
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::ParseError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let api = ClientError::api_error(503, "down");
        assert_eq!(api.to_string(), "API error (status 503): down");
        assert!(!api.is_parse_error());
        assert!(!api.is_network_error());
        assert!(ClientError::ParseError("eof".into()).is_parse_error());
    }
}
