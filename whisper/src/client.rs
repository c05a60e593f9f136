//! Transcription API client.

use std::sync::Arc;
use std::time::Duration;

use super::{
    error::{Error, Result},
    http::HttpClient,
    transcription::TranscriptionService,
};

/// Default OpenAI-compatible API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default request timeout. Uploads of large recordings are slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Transcription API client.
///
/// # Example
///
/// ```rust,ignore
/// use namecast_whisper::Client;
///
/// let client = Client::new("your-api-key")?;
/// let transcription = client.transcription().transcribe(&request).await?;
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

    /// Returns the transcription service.
    pub fn transcription(&self) -> TranscriptionService {
        TranscriptionService::new(self.http.clone())
    }
}

/// Builder for creating a transcription API client.
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

    /// Sets a custom base URL, e.g. a self-hosted compatible server.
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
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be positive".to_string()));
        }

        let http = HttpClient::new(self.base_url.clone(), self.api_key, self.timeout)?;

        Ok(Client {
            http: Arc::new(http),
            base_url: self.base_url,
        })
    }
}
