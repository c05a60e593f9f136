//! HTTP client implementation for the transcription API.

use std::time::Duration;

use reqwest::{
    Client as ReqwestClient, Response,
    header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
    multipart,
};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use super::error::{Error, Result};

const USER_AGENT_VALUE: &str = "namecast-whisper-rust/1.0";

/// HTTP client for the transcription API.
///
/// Performs exactly one attempt per call; retry policy belongs to the caller.
pub struct HttpClient {
    client: ReqwestClient,
    base_url: String,
    api_key: String,
}

impl HttpClient {
    /// Creates a new HTTP client.
    pub fn new(base_url: String, api_key: String, timeout: Duration) -> Result<Self> {
        let client = ReqwestClient::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Posts a multipart form and decodes the JSON response.
    pub async fn post_multipart<R>(&self, path: &str, form: multipart::Form) -> Result<R>
    where
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "whisper: posting multipart request");

        let response = self
            .client
            .post(&url)
            .headers(self.default_headers()?)
            .multipart(form)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Returns default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| Error::Config(format!("api key is not a valid header: {}", e)))?,
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
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

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Parses an error response body.
pub(crate) fn parse_error(body: &[u8], http_status: u16) -> Error {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        let code = match envelope.error.code {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        return Error::Api {
            http_status,
            message: envelope.error.message,
            error_type: envelope.error.error_type.unwrap_or_default(),
            code,
        };
    }

    Error::api(http_status, String::from_utf8_lossy(body).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_structured_error() {
        let body = br#"{"error":{"message":"Audio file is too long","type":"invalid_request_error","code":null}}"#;
        match parse_error(body, 400) {
            Error::Api {
                http_status,
                message,
                error_type,
                code,
            } => {
                assert_eq!(http_status, 400);
                assert_eq!(message, "Audio file is too long");
                assert_eq!(error_type, "invalid_request_error");
                assert!(code.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_plain_error() {
        let err = parse_error(b"upstream connect error", 502);
        assert!(err.is_server_error());
        assert!(err.to_string().contains("upstream connect error"));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let http = HttpClient::new(
            "https://api.example.com/".into(),
            "key".into(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(http.base_url, "https://api.example.com");
    }
}
