//! Collaborator configuration persistence (`llm-config.json`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-3.2-11b-vision-instruct:free";
pub const DEFAULT_TEXT_MODEL: &str = "deepseek/deepseek-r1:free";

/// Stored collaborator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_vision_model")]
    pub vision_model: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    /// Minimum spacing between collaborator calls.
    #[serde(default = "default_min_interval_ms")]
    pub min_request_interval_ms: u64,
    /// Pause before the single retry after a rate-limit response.
    #[serde(default = "default_retry_delay_ms")]
    pub rate_limit_retry_ms: u64,
    /// Upper bound on one extraction's collaborator round trip.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Path to config file for saving.
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}
fn default_vision_model() -> String {
    DEFAULT_VISION_MODEL.into()
}
fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.into()
}
fn default_min_interval_ms() -> u64 {
    2000
}
fn default_retry_delay_ms() -> u64 {
    5000
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            vision_model: default_vision_model(),
            text_model: default_text_model(),
            min_request_interval_ms: default_min_interval_ms(),
            rate_limit_retry_ms: default_retry_delay_ms(),
            request_timeout_secs: default_timeout_secs(),
            config_path: PathBuf::new(),
        }
    }
}

/// Partial update from the settings endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfigUpdate {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub vision_model: Option<String>,
    pub text_model: Option<String>,
    pub min_request_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
}

/// Public view of the configuration (no API key).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfigResponse {
    pub base_url: String,
    pub api_key_configured: bool,
    pub vision_model: String,
    pub text_model: String,
    pub min_request_interval_ms: u64,
    pub request_timeout_secs: u64,
}

impl ExtractionConfig {
    /// Load config from file. Without a file, `OPENROUTER_BASE_URL`,
    /// `VISION_MODEL` and `TEXT_MODEL` override the defaults; the API key
    /// always falls back to `OPENROUTER_API_KEY`.
    pub fn load(config_path: &Path) -> Self {
        let from_file: Option<ExtractionConfig> = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok());
        let has_file = from_file.is_some();

        let mut config = from_file.unwrap_or_default();
        config.config_path = config_path.to_path_buf();

        if !has_file {
            if let Ok(url) = std::env::var("OPENROUTER_BASE_URL") {
                config.base_url = url;
            }
            if let Ok(model) = std::env::var("VISION_MODEL") {
                config.vision_model = model;
            }
            if let Ok(model) = std::env::var("TEXT_MODEL") {
                config.text_model = model;
            }
        }

        if config.api_key.is_none() {
            config.api_key = std::env::var("OPENROUTER_API_KEY").ok();
        }

        config
    }

    /// Save config to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved extraction config to {}", self.config_path.display());
        Ok(())
    }

    pub fn apply_update(&mut self, update: &ExtractionConfigUpdate) {
        if let Some(url) = &update.base_url {
            self.base_url = url.clone();
        }
        if let Some(key) = &update.api_key {
            self.api_key = Some(key.clone()).filter(|k| !k.is_empty());
        }
        if let Some(m) = &update.vision_model {
            self.vision_model = m.clone();
        }
        if let Some(m) = &update.text_model {
            self.text_model = m.clone();
        }
        if let Some(ms) = update.min_request_interval_ms {
            self.min_request_interval_ms = ms;
        }
        if let Some(t) = update.request_timeout_secs {
            self.request_timeout_secs = t.max(1);
        }
    }

    pub fn to_response(&self) -> ExtractionConfigResponse {
        ExtractionConfigResponse {
            base_url: self.base_url.clone(),
            api_key_configured: self.api_key.is_some(),
            vision_model: self.vision_model.clone(),
            text_model: self.text_model.clone(),
            min_request_interval_ms: self.min_request_interval_ms,
            request_timeout_secs: self.request_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");

        let mut config = ExtractionConfig::load(&path);
        config.apply_update(&ExtractionConfigUpdate {
            api_key: Some("sk-test".into()),
            text_model: Some("test/text-model".into()),
            ..Default::default()
        });
        config.save().unwrap();

        let reloaded = ExtractionConfig::load(&path);
        assert_eq!(reloaded.api_key.as_deref(), Some("sk-test"));
        assert_eq!(reloaded.text_model, "test/text-model");
        assert_eq!(reloaded.vision_model, config.vision_model);
        assert_eq!(reloaded.min_request_interval_ms, 2000);
        assert_eq!(reloaded.rate_limit_retry_ms, 5000);
    }

    #[test]
    fn test_response_hides_key() {
        let config = ExtractionConfig {
            api_key: Some("sk-secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&config.to_response()).unwrap();
        assert!(!json.contains("sk-secret"));
        assert!(json.contains("\"apiKeyConfigured\":true"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        std::fs::write(&path, r#"{"base_url": "http://localhost:9999/v1"}"#).unwrap();

        let config = ExtractionConfig::load(&path);
        assert_eq!(config.base_url, "http://localhost:9999/v1");
        assert_eq!(config.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(config.request_timeout_secs, 60);
    }
}
