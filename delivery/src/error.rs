//! Error types for bandwidth probing and variant selection.
//!
//! Estimation itself never fails; these errors only come out of the probe
//! and prober seams and the parsing helpers.

use thiserror::Error;

/// Result type alias for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("unknown quality tier {0:?}")]
    InvalidTier(String),

    #[error("unknown connection type {0:?}")]
    InvalidConnectionType(String),

    #[error("bandwidth probe failed: {0}")]
    Probe(String),

    #[error("bandwidth probe timed out")]
    Timeout,

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl DeliveryError {
    /// Whether measuring or checking again may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryError::Probe(_) | DeliveryError::Timeout => true,
            DeliveryError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            DeliveryError::InvalidTier(_) | DeliveryError::InvalidConnectionType(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_are_final() {
        assert!(!DeliveryError::InvalidTier("4k".into()).is_retryable());
        assert!(!DeliveryError::InvalidConnectionType("5g".into()).is_retryable());
        assert!(DeliveryError::Timeout.is_retryable());
        assert!(DeliveryError::Probe("503".into()).is_retryable());
    }
}
