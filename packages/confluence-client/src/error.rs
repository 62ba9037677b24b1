//! Error types for the Confluence client.

use thiserror::Error;

/// Result type for Confluence client operations.
pub type Result<T> = std::result::Result<T, ConfluenceError>;

/// Confluence client errors.
#[derive(Debug, Error)]
pub enum ConfluenceError {
    /// Configuration error (bad base URL, unusable credentials)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport error (connection refused, timeout, broken body stream)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the REST API
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response parsed but a field the caller needs was absent
    #[error("missing field `{field}` in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },
}

impl ConfluenceError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server refused the request before doing any work (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Failures worth retrying: transport errors, throttling and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Api { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}
