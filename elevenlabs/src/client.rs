//! ElevenLabs API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    http::HttpClient,
    speech::SpeechService,
    voice::VoiceService,
};

/// Default ElevenLabs API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// ElevenLabs API client.
///
/// # Example
///
/// ```rust,ignore
/// use namecast_elevenlabs::Client;
///
/// let client = Client::new("your-api-key")?;
/// let voice = client.voice().get("voice-id").await?;
/// ```
pub struct Client {
    http: Arc<HttpClient>,
    base_url: String,
}

impl Client {
    /// Creates a new client with default settings.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(api_key).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(api_key: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(api_key)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the text-to-speech service.
    pub fn speech(&self) -> SpeechService {
        SpeechService::new(self.http.clone())
    }

    /// Returns the voice management service.
    pub fn voice(&self) -> VoiceService {
        VoiceService::new(self.http.clone())
    }
}

/// Builder for creating an ElevenLabs API client.
pub struct ClientBuilder {
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }

        let http = HttpClient::new(self.base_url.clone(), self.api_key, self.timeout)?;

        Ok(Client {
            http: Arc::new(http),
            base_url: self.base_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build() {
        assert!(matches!(Client::new(""), Err(Error::Config(_))));

        let client = Client::builder("xi-test")
            .base_url("http://127.0.0.1:8080")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_invalid_header_key() {
        assert!(matches!(Client::new("bad\nkey"), Err(Error::Config(_))));
    }
}
