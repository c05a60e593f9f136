//! Error types for the transcription API client.

use thiserror::Error;

/// Result type alias for transcription operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for transcription API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// API error returned by the transcription service.
    #[error("whisper: {message} (status={http_status}, type={error_type}, code={code})")]
    Api {
        http_status: u16,
        message: String,
        error_type: String,
        code: String,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            message: message.into(),
            error_type: String::new(),
            code: String::new(),
        }
    }

    /// Returns the HTTP status for API errors.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Api { http_status, .. } => Some(*http_status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        self.http_status() == Some(429)
    }

    /// Returns true if this is an invalid API key error.
    pub fn is_invalid_api_key(&self) -> bool {
        self.http_status() == Some(401)
    }

    /// Returns true if the service rejected the request itself.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self.http_status(), Some(s) if (400..500).contains(&s) && s != 429)
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self.http_status(), Some(s) if s >= 500)
    }

    /// Returns true if the request never reached the service or timed out.
    pub fn is_network(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_server_error() || self.is_network()
    }
}
