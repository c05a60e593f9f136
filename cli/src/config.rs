//! Context-based CLI configuration.
//!
//! Configuration is stored in `~/.namecast/{app_name}/config.yaml` as a set of
//! named contexts, one of which is current.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use namecast_delivery::DeliveryConfig;
use namecast_personalize::PersonalizeConfig;
use serde::{Deserialize, Serialize};

use crate::paths::Paths;

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Owning application; derived from the load call.
    #[serde(skip)]
    pub app_name: String,

    /// Context used when `-c` is not given.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Contexts by name.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Where [`Config::save`] writes.
    #[serde(skip)]
    config_path: PathBuf,
}

/// A named set of provider credentials and pipeline settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Speech-to-text provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcription: Option<ProviderCredentials>,

    /// Text-to-speech and voice cloning provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<ProviderCredentials>,

    /// Per-request HTTP timeout in seconds; 0 keeps the SDK default.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: u64,

    /// Maximum attempts for transcription and synthesis calls (optional).
    #[serde(default, skip_serializing_if = "is_zero_u32")]
    pub max_retries: u32,

    /// Voice used when a command does not name one.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_voice: String,

    /// Overrides for pipeline defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personalize: Option<PersonalizeConfig>,

    /// Overrides for delivery defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryConfig>,
}

/// Credentials for one upstream provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderCredentials {
    pub api_key: String,

    /// API base URL (optional, uses the SDK default if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub base_url: String,

    /// Model override (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub model: String,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

fn is_zero_u32(n: &u32) -> bool {
    *n == 0
}

impl Config {
    /// `~/.namecast/<app>/config.yaml`.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Paths::new(app_name).ok().map(|p| p.config_file())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Writes the whole file back as YAML.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        self.save()
    }

    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// The named context, or the current one when no name is given.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Context {
    /// Pipeline settings with this context's overrides applied.
    pub fn personalize_config(&self) -> PersonalizeConfig {
        let mut cfg = self.personalize.clone().unwrap_or_default();
        if self.max_retries > 0 {
            cfg.retry.max_attempts = self.max_retries;
        }
        cfg
    }

    pub fn delivery_config(&self) -> DeliveryConfig {
        self.delivery.clone().unwrap_or_default()
    }

    /// Copy safe for display, with API keys masked.
    pub fn masked(&self) -> Context {
        let mask = |c: &Option<ProviderCredentials>| {
            c.as_ref().map(|c| ProviderCredentials {
                api_key: mask_api_key(&c.api_key),
                ..c.clone()
            })
        };
        Context {
            transcription: mask(&self.transcription),
            synthesis: mask(&self.synthesis),
            ..self.clone()
        }
    }
}

/// Loads configuration for the specified app, creating an empty file if none
/// exists yet.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        serde_yaml::from_str(&content)?
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;

    Ok(cfg)
}

/// Keeps the first and last four characters of a key; shorter keys are
/// fully starred.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use namecast_personalize::DuplicatePolicy;

    fn temp_config() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        let cfg = load_config("namecast", Some(path.to_str().unwrap())).unwrap();
        (dir, cfg)
    }

    #[test]
    fn test_context_lifecycle() {
        let (_dir, mut cfg) = temp_config();
        assert!(cfg.path().exists());

        let ctx = Context {
            transcription: Some(ProviderCredentials {
                api_key: "sk-transcribe-0001".into(),
                ..Default::default()
            }),
            default_voice: "voice-1".into(),
            ..Default::default()
        };
        cfg.add_context("prod", ctx.clone()).unwrap();
        cfg.add_context("dev", ctx).unwrap();
        cfg.use_context("prod").unwrap();
        assert_eq!(cfg.list_contexts(), ["dev", "prod"]);

        let reloaded = load_config("namecast", cfg.path().to_str()).unwrap();
        let current = reloaded.get_current_context().unwrap();
        assert_eq!(current.name, "prod");
        assert_eq!(current.default_voice, "voice-1");

        cfg.delete_context("prod").unwrap();
        assert!(cfg.get_current_context().is_none());
        assert!(cfg.use_context("prod").is_err());
        assert!(cfg.delete_context("prod").is_err());
    }

    #[test]
    fn test_personalize_overrides() {
        let yaml = r#"
current_context: default
contexts:
  default:
    name: default
    max_retries: 5
    personalize:
      duplicate_policy: reject_ambiguous
      enforce_upload_limits: false
    delivery:
      probe_url: https://cdn.example.com/probe.bin
"#;
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        let ctx = cfg.resolve_context(None).unwrap();
        let p = ctx.personalize_config();
        assert_eq!(p.retry.max_attempts, 5);
        assert_eq!(p.duplicate_policy, DuplicatePolicy::RejectAmbiguous);
        assert!(!p.enforce_upload_limits);
        assert_eq!(p.placeholder, "prospect");
        assert_eq!(
            ctx.delivery_config().probe_url.as_deref(),
            Some("https://cdn.example.com/probe.bin")
        );
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("sk-1234567890abcd"), "sk-1*********abcd");

        let ctx = Context {
            synthesis: Some(ProviderCredentials {
                api_key: "xi-abcdefghijkl".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        let masked = ctx.masked();
        assert_eq!(masked.synthesis.unwrap().api_key, "xi-a*******ijkl");
        assert!(masked.transcription.is_none());
    }
}
