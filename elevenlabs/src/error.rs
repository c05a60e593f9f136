//! Error types for the ElevenLabs API client.

use thiserror::Error;

/// Result type alias for ElevenLabs operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for ElevenLabs API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// API error returned by ElevenLabs.
    #[error("elevenlabs: {message} (status={status}, http={http_status})")]
    Api {
        http_status: u16,
        status: String,
        message: String,
    },

    /// HTTP request error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Invalid configuration or argument.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a new API error.
    pub fn api(http_status: u16, status: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Api {
            http_status,
            status: status.into(),
            message: message.into(),
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

    /// Returns true if the referenced voice (or other resource) does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Api {
                http_status,
                status,
                ..
            } => *http_status == 404 || status.ends_with("not_found"),
            _ => false,
        }
    }

    /// Returns true if this is a rate limit or concurrency limit error.
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Error::Api { status, .. } if status == "too_many_concurrent_requests" => true,
            _ => self.http_status() == Some(429),
        }
    }

    /// Returns true if this is an invalid API key error.
    pub fn is_invalid_api_key(&self) -> bool {
        match self {
            Error::Api { status, .. } if status == "invalid_api_key" => true,
            _ => self.http_status() == Some(401),
        }
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
        !self.is_not_found() && (self.is_rate_limit() || self.is_server_error() || self.is_network())
    }
}
