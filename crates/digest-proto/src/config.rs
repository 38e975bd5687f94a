use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

/// Environment variable that overrides `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "DIGEST_BACKEND_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub summaries: SummariesConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the analysis backend. Left empty, every request fails.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between keep-warm pings of the backend root.
    #[serde(default = "default_keep_warm_secs")]
    pub keep_warm_secs: u64,
    /// Seconds between scheduled channel summary fetches.
    #[serde(default = "default_summaries_refresh_secs")]
    pub summaries_refresh_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummariesConfig {
    /// Internal channels never shown in the summary list.
    #[serde(default = "default_excluded_channels")]
    pub excluded_channels: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the server scrape form on the query tab.
    #[serde(default)]
    pub scrape_enabled: bool,
    #[serde(default = "default_message_limit")]
    pub default_message_limit: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            keep_warm_secs: default_keep_warm_secs(),
            summaries_refresh_secs: default_summaries_refresh_secs(),
        }
    }
}

impl Default for SummariesConfig {
    fn default() -> Self {
        Self {
            excluded_channels: default_excluded_channels(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            scrape_enabled: false,
            default_message_limit: default_message_limit(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_keep_warm_secs() -> u64 {
    10
}

fn default_summaries_refresh_secs() -> u64 {
    5 * 60
}

fn default_excluded_channels() -> Vec<String> {
    vec!["dots-admin".to_string(), "customer-whitelabel".to_string()]
}

fn default_message_limit() -> u32 {
    100
}

impl PollingConfig {
    pub fn keep_warm_interval(&self) -> Duration {
        Duration::from_secs(self.keep_warm_secs.max(1))
    }

    pub fn summaries_interval(&self) -> Duration {
        Duration::from_secs(self.summaries_refresh_secs.max(1))
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing a default file first if none exists.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Apply `DIGEST_BACKEND_URL` if set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            self.override_base_url(&url);
        }
    }

    fn override_base_url(&mut self, url: &str) {
        let url = url.trim();
        if !url.is_empty() {
            self.backend.base_url = url.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.backend.base_url.is_empty());
        assert_eq!(config.polling.keep_warm_secs, 10);
        assert_eq!(config.polling.summaries_refresh_secs, 300);
        assert_eq!(
            config.summaries.excluded_channels,
            vec!["dots-admin", "customer-whitelabel"]
        );
        assert!(!config.ui.scrape_enabled);
        assert_eq!(config.ui.default_message_limit, 100);
        assert!(Config::config_path().ends_with("digest/config.toml"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = Config::from_toml_str(
            r#"
            [backend]
            base_url = "https://example.modal.run"

            [polling]
            keep_warm_secs = 30
            "#,
        )
        .unwrap();
        assert_eq!(config.backend.base_url, "https://example.modal.run");
        assert_eq!(config.backend.request_timeout_secs, 120);
        assert_eq!(config.polling.keep_warm_secs, 30);
        assert_eq!(config.polling.summaries_refresh_secs, 300);
        assert_eq!(config.summaries.excluded_channels.len(), 2);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(Config::from_toml_str("backend = 3").is_err());
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let polling = PollingConfig {
            keep_warm_secs: 0,
            summaries_refresh_secs: 0,
        };
        assert_eq!(polling.keep_warm_interval(), Duration::from_secs(1));
        assert_eq!(polling.summaries_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_base_url_override_ignores_blank() {
        let mut config = Config::default();
        config.override_base_url("   ");
        assert!(config.backend.base_url.is_empty());
        config.override_base_url(" http://localhost:8000 ");
        assert_eq!(config.backend.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_load_from_writes_default_file() {
        let dir = std::env::temp_dir().join(format!("digest-config-test-{}", std::process::id()));
        let path = dir.join("config.toml");
        let _ = std::fs::remove_file(&path);

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.polling.keep_warm_secs, 10);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(
            reloaded.summaries.excluded_channels,
            config.summaries.excluded_channels
        );
        let _ = std::fs::remove_dir_all(&dir);
    }
}
