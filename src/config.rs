//! Configuration management for agentctl
//!
//! This module handles loading, parsing, and saving the YAML
//! configuration file, including per-provider credentials and the
//! default generation settings.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Root configuration structure for agentctl
///
/// Holds per-provider settings keyed by provider name, the default
/// generation parameters, and cost-tracking behavior.
///
/// # Examples
///
/// ```
/// use agentctl::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.defaults.provider, "anthropic");
/// assert!(config.costs.track);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-provider settings, keyed by registry name
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Default generation settings
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Cost tracking settings
    #[serde(default)]
    pub costs: CostsConfig,
}

/// Configuration for a single provider
///
/// Every field is optional; adapters apply their own defaults for
/// whatever is left unset. Unknown keys land in `extra` so configs
/// written for newer versions still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (hosted providers only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override (useful for tests and local mocks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Model used when a call does not specify one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    /// Provider-specific extras, passed through untouched
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Default generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Provider used when a command does not name one
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default output token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "anthropic".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Cost tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostsConfig {
    /// Whether to record usage to the cost log
    #[serde(default = "default_track")]
    pub track: bool,

    /// Monthly spend above which `costs` highlights the total
    #[serde(default = "default_alert_threshold")]
    pub alert_threshold: f64,
}

fn default_track() -> bool {
    true
}

fn default_alert_threshold() -> f64 {
    50.0
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            track: default_track(),
            alert_threshold: default_alert_threshold(),
        }
    }
}

impl Config {
    /// Loads configuration from a YAML file, or returns defaults if the
    /// file does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use agentctl::config::Config;
    ///
    /// let config = Config::load(std::path::Path::new("config.yaml")).unwrap();
    /// println!("default provider: {}", config.defaults.provider);
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        tracing::debug!(
            "Loaded config from {} ({} providers)",
            path.display(),
            config.providers.len()
        );
        Ok(config)
    }

    /// Persists configuration to a YAML file, creating parent
    /// directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)?;
        tracing::debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolves a provider name and its settings
    ///
    /// Falls back to the default provider when `name` is `None`, and to
    /// an empty `ProviderConfig` when the named provider has no section
    /// in the file. Name resolution against the registry happens later;
    /// this only merges configuration.
    pub fn get_provider(&self, name: Option<&str>) -> (String, ProviderConfig) {
        let name = name.unwrap_or(&self.defaults.provider).to_string();
        let config = self.providers.get(&name).cloned().unwrap_or_default();
        (name, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.providers.is_empty());
        assert_eq!(config.defaults.provider, "anthropic");
        assert_eq!(config.defaults.temperature, 0.7);
        assert_eq!(config.defaults.max_tokens, 4096);
        assert!(config.costs.track);
        assert_eq!(config.costs.alert_threshold, 50.0);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
providers:
  anthropic:
    api_key: sk-ant-test
  openai:
    api_key: sk-test
    default_model: gpt-4o-mini
  ollama:
    endpoint: http://gpu-box:11434
defaults:
  provider: openai
  temperature: 0.2
costs:
  track: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(
            config.providers["anthropic"].api_key.as_deref(),
            Some("sk-ant-test")
        );
        assert_eq!(
            config.providers["openai"].default_model.as_deref(),
            Some("gpt-4o-mini")
        );
        assert_eq!(
            config.providers["ollama"].endpoint.as_deref(),
            Some("http://gpu-box:11434")
        );
        assert_eq!(config.defaults.provider, "openai");
        assert_eq!(config.defaults.temperature, 0.2);
        // Unspecified fields keep their defaults
        assert_eq!(config.defaults.max_tokens, 4096);
        assert!(!config.costs.track);
        assert_eq!(config.costs.alert_threshold, 50.0);
    }

    #[test]
    fn test_parse_empty_config() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.defaults.provider, "anthropic");
        assert!(config.costs.track);
    }

    #[test]
    fn test_get_provider_named() {
        let yaml = r#"
providers:
  openai:
    api_key: sk-test
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let (name, provider) = config.get_provider(Some("openai"));
        assert_eq!(name, "openai");
        assert_eq!(provider.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_get_provider_falls_back_to_default() {
        let config = Config::default();
        let (name, provider) = config.get_provider(None);
        assert_eq!(name, "anthropic");
        assert!(provider.api_key.is_none());
    }

    #[test]
    fn test_get_provider_unconfigured_name() {
        let config = Config::default();
        let (name, provider) = config.get_provider(Some("ollama"));
        assert_eq!(name, "ollama");
        assert!(provider.endpoint.is_none());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("missing.yaml")).unwrap();
        assert_eq!(config.defaults.provider, "anthropic");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let mut config = Config::default();
        config.defaults.provider = "ollama".to_string();
        config.providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                endpoint: Some("http://localhost:11434".to_string()),
                ..Default::default()
            },
        );
        config.save(&path).unwrap();

        let reloaded = Config::load(&path).unwrap();
        assert_eq!(reloaded.defaults.provider, "ollama");
        assert_eq!(
            reloaded.providers["ollama"].endpoint.as_deref(),
            Some("http://localhost:11434")
        );
    }

    #[test]
    fn test_load_invalid_yaml_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "providers: [not, a, map]").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
