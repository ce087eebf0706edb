use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::engine::EngineConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8787
}

/// Where durable state lives.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    /// Lost on restart; useful for tests and dry runs.
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// SQLite file (ignored by the memory backend).
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("lottohunt.db")
}

/// The vendor pages the workflow runs on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkflowConfig {
    /// Page opened for a fresh workspace tab.
    #[serde(default = "default_target_url")]
    pub target_url: String,
    /// Tabs whose URL starts with this are search-page candidates.
    #[serde(default = "default_search_page_prefix")]
    pub search_page_prefix: String,
    /// Regex matched against tab URLs to recognise the search page.
    #[serde(default = "default_search_page_pattern")]
    pub search_page_pattern: String,
    /// Regex for login pages; an owned tab may visit these mid-session.
    #[serde(default = "default_login_page_pattern")]
    pub login_page_pattern: String,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            target_url: default_target_url(),
            search_page_prefix: default_search_page_prefix(),
            search_page_pattern: default_search_page_pattern(),
            login_page_pattern: default_login_page_pattern(),
        }
    }
}

fn default_target_url() -> String {
    "https://www.stoloto.ru/ruslotto/game?viewType=tickets".to_string()
}

fn default_search_page_prefix() -> String {
    "https://www.stoloto.ru/ruslotto/game".to_string()
}

fn default_search_page_pattern() -> String {
    r"stoloto\.ru/ruslotto/game".to_string()
}

fn default_login_page_pattern() -> String {
    r"stoloto\.ru/(login|auth)".to_string()
}

/// Extension bridge configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// How long a bridged request may wait for its response (milliseconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Capacity of the extension event queue and the panel broadcast channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            event_buffer: default_event_buffer(),
        }
    }
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_event_buffer() -> usize {
    256
}

/// Config as served on the API.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub storage: SanitizedStorageConfig,
    pub workflow: WorkflowConfig,
    pub engine: EngineConfig,
    pub bridge: BridgeConfig,
}

/// Storage config without the filesystem path.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub backend: String,
    pub path_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            storage: SanitizedStorageConfig {
                backend: match config.storage.backend {
                    StorageBackend::Sqlite => "sqlite".to_string(),
                    StorageBackend::Memory => "memory".to_string(),
                },
                path_configured: config.storage.backend == StorageBackend::Sqlite,
            },
            workflow: config.workflow.clone(),
            engine: config.engine.clone(),
            bridge: config.bridge.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.host.to_string(), "127.0.0.1");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path.to_str().unwrap(), "lottohunt.db");
        assert_eq!(config.engine.reload_delay_ms, 20_000);
        assert_eq!(config.bridge.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_deserialize_sections() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 9000

[storage]
backend = "memory"

[workflow]
target_url = "https://vendor.test/game"

[engine]
click_pause_ms = 250
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.workflow.target_url, "https://vendor.test/game");
        assert_eq!(
            config.workflow.search_page_prefix,
            "https://www.stoloto.ru/ruslotto/game"
        );
        assert_eq!(config.engine.click_pause_ms, 250);
        assert_eq!(config.engine.post_select_settle_ms, 2000);
    }

    #[test]
    fn test_unknown_backend_fails() {
        let toml = r#"
[storage]
backend = "redis"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config() {
        let config = Config::default();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.storage.backend, "sqlite");
        assert!(sanitized.storage.path_configured);
        assert_eq!(sanitized.server.port, 8787);

        let json = serde_json::to_value(&sanitized).unwrap();
        assert!(json["storage"].get("path").is_none());
    }
}
