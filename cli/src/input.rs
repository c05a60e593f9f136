//! Loading command inputs from files.

use std::fs;
use std::io;
use std::path::Path;

use namecast_personalize::{Recording, media_type_for_extension};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error type for input loading.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse file (tried YAML and JSON)")]
    ParseFailed,
    #[error("cannot infer media type of {0}; pass it explicitly")]
    UnknownMediaType(String),
}

/// Loads a YAML or JSON document (e.g. a prospect list).
pub fn load_document<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, InputError> {
    let data = fs::read(path.as_ref())?;
    parse_document(&data, path.as_ref())
}

/// Parses document data based on file extension, trying both formats when
/// the extension is unknown.
pub fn parse_document<T: DeserializeOwned>(data: &[u8], path: impl AsRef<Path>) -> Result<T, InputError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(data)?),
        Some("json") => Ok(serde_json::from_slice(data)?),
        _ => {
            if let Ok(v) = serde_yaml::from_slice(data) {
                return Ok(v);
            }
            if let Ok(v) = serde_json::from_slice(data) {
                return Ok(v);
            }
            Err(InputError::ParseFailed)
        }
    }
}

/// Reads a media file into a [`Recording`], inferring the media type from
/// the extension unless one is given.
pub fn load_recording(path: impl AsRef<Path>, media_type: Option<&str>) -> Result<Recording, InputError> {
    let path = path.as_ref();
    let media_type = match media_type {
        Some(m) => m.to_string(),
        None => path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(media_type_for_extension)
            .map(str::to_string)
            .ok_or_else(|| InputError::UnknownMediaType(path.display().to_string()))?,
    };
    let data = fs::read(path)?;
    let mut recording = Recording::new(data, media_type);
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        recording = recording.with_file_name(name);
    }
    Ok(recording)
}
