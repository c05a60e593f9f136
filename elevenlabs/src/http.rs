//! HTTP client implementation for the ElevenLabs API.

use std::time::Duration;

use reqwest::{
    Client as ReqwestClient, Method, RequestBuilder, Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT},
    multipart,
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use super::error::{Error, Result};

const API_KEY_HEADER: HeaderName = HeaderName::from_static("xi-api-key");
const USER_AGENT_VALUE: &str = "namecast-elevenlabs-rust/1.0";

/// HTTP client for the ElevenLabs API.
///
/// Performs exactly one attempt per call; retry policy belongs to the caller.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    api_key: HeaderValue,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;
        let api_key = HeaderValue::from_str(&api_key)
            .map_err(|e| Error::Config(format!("api key is not a valid header: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Makes a JSON request and decodes the JSON response.
    pub async fn request<T, R>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&T>,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let mut request = self.builder(method, path).query(query);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .json(body);
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Posts a multipart form and decodes the JSON response.
    pub async fn post_multipart<R>(&self, path: &str, form: multipart::Form) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let response = self
            .builder(Method::POST, path)
            .multipart(form)
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn builder(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!(method = %method, url = %url, "elevenlabs: request");
        self.client.request(method, url).headers(self.default_headers())
    }

    /// Returns default headers for API requests.
    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers
    }

    /// Handles the API response.
    async fn handle_response<R>(&self, response: Response) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(parse_error(&body, status.as_u16()));
        }

        serde_json::from_slice(&body).map_err(Error::from)
    }
}

/// Parses an error response body.
///
/// The API reports errors as `{"detail": {"status", "message"}}`, as a bare
/// `{"detail": "..."}` string, or as a list of validation failures.
pub(crate) fn parse_error(body: &[u8], http_status: u16) -> Error {
    let Ok(value) = serde_json::from_slice::<Value>(body) else {
        return Error::api(http_status, "", String::from_utf8_lossy(body).to_string());
    };

    match value.get("detail") {
        Some(Value::Object(detail)) => {
            let field = |name: &str| {
                detail
                    .get(name)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            Error::api(http_status, field("status"), field("message"))
        }
        Some(Value::String(message)) => Error::api(http_status, "", message.clone()),
        Some(Value::Array(items)) => {
            let message = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            Error::api(http_status, "validation_error", message)
        }
        _ => Error::api(http_status, "", value.to_string()),
    }
}
