//! Configuration for the assistant.
//!
//! Loads configuration from a `config.toml` with sensible defaults, and
//! resolves credentials against the environment.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn/v1";
/// Default chat model.
pub const DEFAULT_MODEL: &str = "Qwen/Qwen2.5-Coder-7B-Instruct";
/// Default sampling temperature for chat requests.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Assistant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// API key. Falls back to `INKPAD_API_KEY` when absent.
    pub api_key: Option<String>,
    /// OpenAI-compatible base URL. `INKPAD_BASE_URL` overrides.
    pub base_url: Option<String>,
    /// Chat model identifier.
    pub model: String,
    /// Sampling temperature for chat requests.
    pub temperature: f32,
    /// Prefer stored note summaries over content previews when building
    /// request context.
    pub auto_summary: bool,
    /// Models offered in the model picker, in display order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub saved_models: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            auto_summary: false,
            saved_models: Vec::new(),
        }
    }
}

impl AssistantConfig {
    /// Loads configuration from `path`, returning defaults when the file
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Resolves the API key with precedence: config > `INKPAD_API_KEY`.
    ///
    /// # Errors
    /// Returns an error when neither source provides a key.
    pub fn resolve_api_key(&self) -> Result<String> {
        if let Some(key) = &self.api_key {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }
        std::env::var("INKPAD_API_KEY")
            .context("No API key available. Set INKPAD_API_KEY or api_key in config.toml.")
    }

    /// Resolves the base URL with precedence: `INKPAD_BASE_URL` > config >
    /// default.
    ///
    /// # Errors
    /// Returns an error when the chosen URL is malformed.
    pub fn resolve_base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var("INKPAD_BASE_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }
        if let Some(config_url) = &self.base_url {
            let trimmed = config_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.to_string());
            }
        }
        Ok(DEFAULT_BASE_URL.to_string())
    }
}

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AssistantConfig::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
        assert!(!config.auto_summary);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "model = \"some/other-model\"").unwrap();

        let config = AssistantConfig::load(&path).unwrap();
        assert_eq!(config.model, "some/other-model");
        assert_eq!(config.temperature, DEFAULT_TEMPERATURE);
    }

    #[test]
    fn test_resolve_base_url_rejects_garbage() {
        let config = AssistantConfig {
            base_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(config.resolve_base_url().is_err());
    }

    #[test]
    fn test_resolve_api_key_prefers_config() {
        let config = AssistantConfig {
            api_key: Some("  sk-test  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.resolve_api_key().unwrap(), "sk-test");
    }
}
