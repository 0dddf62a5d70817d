use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    ACCOUNT_LIST_POLL_MS, DEFAULT_ENDPOINT, DEFAULT_PAGE_LIMIT, ENDPOINT_ENV_VAR,
    FOLDER_COUNT_POLL_MS, MAX_PAGE_LIMIT, MESSAGE_POLL_MS, REQUEST_TIMEOUT_SECS,
};
use crate::mail::{PageRequest, SortKey, SortOrder};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

/// Where the backend lives. Handed to the HTTP client at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Folder count refresh interval
    #[serde(default = "default_folder_counts_ms")]
    pub folder_counts_ms: u64,
    /// Message list refresh interval
    #[serde(default = "default_messages_ms")]
    pub messages_ms: u64,
    /// Account directory refresh interval while composing
    #[serde(default = "default_accounts_ms")]
    pub accounts_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            folder_counts_ms: default_folder_counts_ms(),
            messages_ms: default_messages_ms(),
            accounts_ms: default_accounts_ms(),
        }
    }
}

impl PollingConfig {
    pub fn folder_counts_interval(&self) -> Duration {
        Duration::from_millis(self.folder_counts_ms.max(1))
    }

    pub fn messages_interval(&self) -> Duration {
        Duration::from_millis(self.messages_ms.max(1))
    }

    pub fn accounts_interval(&self) -> Duration {
        Duration::from_millis(self.accounts_ms.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagingConfig {
    #[serde(default = "default_page_limit")]
    pub limit: u32,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            limit: default_page_limit(),
            sort: SortKey::default(),
            order: SortOrder::default(),
        }
    }
}

impl PagingConfig {
    /// First page with the configured sort. The limit is clamped to what
    /// the server accepts.
    pub fn first_page(&self) -> PageRequest {
        PageRequest {
            sort: self.sort,
            order: self.order,
            limit: self.limit.clamp(1, MAX_PAGE_LIMIT),
            page: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    REQUEST_TIMEOUT_SECS
}

fn default_folder_counts_ms() -> u64 {
    FOLDER_COUNT_POLL_MS
}

fn default_messages_ms() -> u64 {
    MESSAGE_POLL_MS
}

fn default_accounts_ms() -> u64 {
    ACCOUNT_LIST_POLL_MS
}

fn default_page_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

fn default_date_format() -> String {
    "%b %d %H:%M".to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("tcmail");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load the config file, falling back to defaults when it does not
    /// exist. The endpoint environment variable wins over both.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::from_toml(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };

        if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
            config.apply_endpoint_override(&endpoint);
        }
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid configuration")
    }

    pub fn apply_endpoint_override(&mut self, endpoint: &str) {
        let endpoint = endpoint.trim();
        if !endpoint.is_empty() {
            self.server.endpoint = endpoint.to_string();
        }
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        let dir = path
            .parent()
            .context("Config path has no parent directory")?;

        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(path)
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(Self::config_dir()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.endpoint, "http://127.0.0.1:8080");
        assert_eq!(config.polling.folder_counts_ms, 900);
        assert_eq!(config.polling.messages_ms, 2000);
        assert_eq!(config.paging.limit, 10);
        assert_eq!(config.paging.sort, SortKey::Time);
        assert_eq!(config.paging.order, SortOrder::Descending);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            endpoint = "http://mail.example.com:8080"
            timeout_secs = 3

            [polling]
            folder_counts_ms = 500
            messages_ms = 1500

            [paging]
            limit = 25
            sort = "subject"
            order = "ascending"

            [ui]
            date_format = "%Y-%m-%d"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.server.endpoint, "http://mail.example.com:8080");
        assert_eq!(config.server.timeout_secs, 3);
        assert_eq!(config.polling.folder_counts_interval(), Duration::from_millis(500));
        assert_eq!(config.polling.accounts_ms, 3000);
        assert_eq!(config.paging.sort, SortKey::Subject);
        assert_eq!(config.paging.order, SortOrder::Ascending);
        assert_eq!(config.ui.date_format, "%Y-%m-%d");

        let page = config.paging.first_page();
        assert_eq!(page.limit, 25);
        assert_eq!(page.page, 0);
    }

    #[test]
    fn test_page_limit_clamped() {
        let paging = PagingConfig {
            limit: 0,
            ..Default::default()
        };
        assert_eq!(paging.first_page().limit, 1);

        let paging = PagingConfig {
            limit: 5000,
            ..Default::default()
        };
        assert_eq!(paging.first_page().limit, 100);
    }

    #[test]
    fn test_endpoint_override() {
        let mut config = Config::default();
        config.apply_endpoint_override("   ");
        assert_eq!(config.server.endpoint, "http://127.0.0.1:8080");
        config.apply_endpoint_override("http://10.0.0.2:9000");
        assert_eq!(config.server.endpoint, "http://10.0.0.2:9000");
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.server.endpoint, config.server.endpoint);
        assert_eq!(parsed.paging.limit, config.paging.limit);
    }
}
