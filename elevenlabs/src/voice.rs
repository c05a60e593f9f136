//! Voice management service.

use std::sync::Arc;

use reqwest::{Method, multipart};
use serde::{Deserialize, Serialize};

use super::{
    error::{Error, Result},
    http::HttpClient,
};

/// Voice management service.
pub struct VoiceService {
    http: Arc<HttpClient>,
}

impl VoiceService {
    pub(crate) fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    /// Creates an instant voice clone from one or more samples.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let request = VoiceAddRequest {
    ///     name: "Founder intro".to_string(),
    ///     files: vec![VoiceSample::new(bytes, "sample.mp3", "audio/mpeg")],
    ///     ..Default::default()
    /// };
    ///
    /// let response = client.voice().add(request).await?;
    /// println!("cloned voice: {}", response.voice_id);
    /// ```
    pub async fn add(&self, request: VoiceAddRequest) -> Result<VoiceAddResponse> {
        if request.name.trim().is_empty() {
            return Err(Error::Config("voice name must be non-empty".to_string()));
        }
        if request.files.is_empty() {
            return Err(Error::Config("at least one voice sample is required".to_string()));
        }

        let mut form = multipart::Form::new().text("name", request.name);
        for sample in request.files {
            let part = multipart::Part::bytes(sample.data)
                .file_name(sample.file_name)
                .mime_str(&sample.mime_type)?;
            form = form.part("files", part);
        }
        if let Some(description) = request.description {
            form = form.text("description", description);
        }
        if request.remove_background_noise {
            form = form.text("remove_background_noise", "true");
        }

        self.http.post_multipart("/v1/voices/add", form).await
    }

    /// Fetches a voice by ID. Fails with a not-found error for unknown voices.
    pub async fn get(&self, voice_id: &str) -> Result<VoiceInfo> {
        validate_voice_id(voice_id)?;
        let path = format!("/v1/voices/{}", voice_id);
        self.http
            .request::<(), _>(Method::GET, &path, &[], None)
            .await
    }
}

/// Voice IDs are interpolated into request paths, so only URL-safe
/// identifiers are accepted.
pub(crate) fn validate_voice_id(voice_id: &str) -> Result<()> {
    if voice_id.is_empty() {
        return Err(Error::Config("voice_id must be non-empty".to_string()));
    }
    if !voice_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::Config(format!("invalid voice_id: {:?}", voice_id)));
    }
    Ok(())
}

// ==================== Request/Response Types ====================

/// A single audio sample used for cloning.
#[derive(Debug, Clone, Default)]
pub struct VoiceSample {
    pub data: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
}

impl VoiceSample {
    pub fn new(data: Vec<u8>, file_name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Request for an instant voice clone.
#[derive(Debug, Clone, Default)]
pub struct VoiceAddRequest {
    pub name: String,
    pub files: Vec<VoiceSample>,
    pub description: Option<String>,
    pub remove_background_noise: bool,
}

/// Response from voice cloning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceAddResponse {
    pub voice_id: String,
    #[serde(default)]
    pub requires_verification: bool,
}

/// Voice details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_voice_id() {
        assert!(validate_voice_id("21m00Tcm4TlvDq8ikWAM").is_ok());
        assert!(validate_voice_id("voice_1-a").is_ok());
        assert!(validate_voice_id("").is_err());
        assert!(validate_voice_id("../admin").is_err());
        assert!(validate_voice_id("a?b=c").is_err());
    }

    #[test]
    fn test_decode_voice_info() {
        let body = r#"{"voice_id":"abc","name":"Founder","category":"cloned","labels":{}}"#;
        let info: VoiceInfo = serde_json::from_str(body).unwrap();
        assert_eq!(info.voice_id, "abc");
        assert_eq!(info.category.as_deref(), Some("cloned"));
    }
}
