use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::ai::{API_KEY_ENV, DEFAULT_MODEL};
use crate::session::DEFAULT_DEBOUNCE;
use crate::store::http::DEFAULT_TIMEOUT;

const FILENAME: &str = "config.yaml";
const APP_DIR: &str = "limeflow";

/// Where share links point when no base is configured.
pub const DEFAULT_SHARE_BASE: &str = "http://localhost:5173/";

const VALID_KEYS: &str = "defaults.theme, share.base_url, store.endpoint, store.timeout_secs, autosave.debounce_ms, ai.model, ai.api_key";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share: Option<ShareConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<StoreConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autosave: Option<AutosaveConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai: Option<AiConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Address of the hosted app that share links open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Suggested in the connect prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutosaveConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API key. If not set, falls back to the GEMINI_API_KEY environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl AiConfig {
    /// Resolve API key from config or environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = &self.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty())
    }
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join(APP_DIR).join(FILENAME))
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
    }

    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                anyhow::anyhow!("No config found. Run `limeflow config show` to see defaults.")
            } else {
                anyhow::anyhow!("Failed to read config: {e}")
            }
        })?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        let contents = format!("# LimeFlow configuration\n{yaml}");
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn theme(&self) -> &str {
        self.defaults
            .as_ref()
            .and_then(|d| d.theme.as_deref())
            .unwrap_or("light")
    }

    pub fn share_base(&self) -> &str {
        self.share
            .as_ref()
            .and_then(|s| s.base_url.as_deref())
            .unwrap_or(DEFAULT_SHARE_BASE)
    }

    pub fn default_endpoint(&self) -> Option<&str> {
        self.store.as_ref().and_then(|s| s.endpoint.as_deref())
    }

    pub fn store_timeout(&self) -> Duration {
        self.store
            .as_ref()
            .and_then(|s| s.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn debounce(&self) -> Duration {
        self.autosave
            .as_ref()
            .and_then(|a| a.debounce_ms)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_DEBOUNCE)
    }

    pub fn ai_model(&self) -> &str {
        self.ai
            .as_ref()
            .and_then(|a| a.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn ai_api_key(&self) -> Option<String> {
        self.ai
            .clone()
            .unwrap_or_default()
            .resolve_api_key()
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "defaults.theme" => {
                match value {
                    "light" | "dark" => {}
                    _ => anyhow::bail!("Invalid theme: {value}. Must be 'light' or 'dark'."),
                }
                self.defaults
                    .get_or_insert_with(DefaultsConfig::default)
                    .theme = Some(value.to_string());
            }
            "share.base_url" => {
                if let Err(e) = url::Url::parse(value) {
                    anyhow::bail!("Invalid base URL: {value} ({e}).");
                }
                self.share.get_or_insert_with(ShareConfig::default).base_url =
                    Some(value.to_string());
            }
            "store.endpoint" => {
                let endpoint = value.trim();
                if endpoint.is_empty() {
                    anyhow::bail!("Store endpoint must not be empty.");
                }
                self.store.get_or_insert_with(StoreConfig::default).endpoint =
                    Some(endpoint.to_string());
            }
            "store.timeout_secs" => {
                let secs = parse_positive(key, value)?;
                self.store
                    .get_or_insert_with(StoreConfig::default)
                    .timeout_secs = Some(secs);
            }
            "autosave.debounce_ms" => {
                let ms = parse_positive(key, value)?;
                self.autosave
                    .get_or_insert_with(AutosaveConfig::default)
                    .debounce_ms = Some(ms);
            }
            "ai.model" => {
                self.ai.get_or_insert_with(AiConfig::default).model = Some(value.to_string());
            }
            "ai.api_key" => {
                self.ai.get_or_insert_with(AiConfig::default).api_key = Some(value.to_string());
            }
            _ => anyhow::bail!("Unknown config key: {key}. Valid keys: {VALID_KEYS}"),
        }
        Ok(())
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => anyhow::bail!("Invalid {key}: {value}. Must be a positive whole number."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.theme(), "light");
        assert_eq!(config.share_base(), DEFAULT_SHARE_BASE);
        assert_eq!(config.debounce(), DEFAULT_DEBOUNCE);
        assert_eq!(config.ai_model(), DEFAULT_MODEL);
        assert_eq!(config.default_endpoint(), None);
    }

    #[test]
    fn test_set_validates() {
        let mut config = Config::default();
        config.set("defaults.theme", "dark").unwrap();
        config.set("autosave.debounce_ms", "500").unwrap();
        config.set("store.timeout_secs", "10").unwrap();
        assert_eq!(config.theme(), "dark");
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.store_timeout(), Duration::from_secs(10));

        assert!(config.set("defaults.theme", "neon").is_err());
        assert!(config.set("autosave.debounce_ms", "0").is_err());
        assert!(config.set("store.timeout_secs", "soon").is_err());
        assert!(config.set("share.base_url", "not a url").is_err());
        assert!(config.set("store.endpoint", "   ").is_err());
        assert!(config.set("defaults.transition", "fade").is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("limeflow").join(FILENAME);

        let mut config = Config::default();
        config.set("share.base_url", "https://deck.example/").unwrap();
        config.set("store.endpoint", " https://script.example/exec ").unwrap();
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.share_base(), "https://deck.example/");
        assert_eq!(loaded.default_endpoint(), Some("https://script.example/exec"));
        assert!(loaded.ai.is_none());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join(FILENAME)).unwrap_err();
        assert!(err.to_string().contains("No config found"));
    }
}
