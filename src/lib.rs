//! nodepay-keeper
//!
//! A lightweight client that keeps one or more nodepay accounts marked
//! "online". Each account gets its own worker holding a stable browser
//! identity, a cookie store, and an HTTP transport (optionally routed
//! through a proxy); the worker performs the session exchange once and then
//! sends keep-alive pings on a fixed interval.

pub mod auth;
pub mod input;
pub mod ping;
pub mod proxy;
pub mod shutdown;
pub mod stats;
pub mod worker;

use std::path::PathBuf;
use tracing::{error, info, warn};

/// Browser user agent reported on every request.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Application configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    /// Network endpoints
    #[serde(rename = "baseURL")]
    pub base_url: String,
    #[serde(rename = "ipCheckURL")]
    pub ip_check_url: String,
    #[serde(rename = "pingURL")]
    pub ping_url: String,
    #[serde(rename = "sessionURL")]
    pub session_url: String,

    /// Ping period in milliseconds
    pub retry_interval: u64,

    /// Bound on any single HTTP request
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Newline-delimited file of account bearer tokens
    pub tokens_file: PathBuf,

    /// Optional newline-delimited proxy list (direct connection when unset)
    pub proxies_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nodepay.org".to_string(),
            ip_check_url: "https://ipinfo.io/json".to_string(),
            ping_url: "https://nw.nodepay.ai/api/network/ping".to_string(),
            session_url: "http://api.nodepay.ai/api/auth/session".to_string(),
            retry_interval: 3000,
            request_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            tokens_file: PathBuf::from("tokens.txt"),
            proxies_file: None,
        }
    }
}

/// Get log directory path (shared across modules)
pub fn log_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("nodepay-keeper").join("logs"))
}

impl AppConfig {
    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("nodepay-keeper").join("config.json"))
    }

    /// Load config from file
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(content) => match serde_json::from_str(&content) {
                        Ok(config) => {
                            info!("Loaded config from {:?}", path);
                            return config;
                        }
                        Err(e) => {
                            warn!("Failed to parse config file: {}", e);
                        }
                    },
                    Err(e) => {
                        warn!("Failed to read config file: {}", e);
                    }
                }
            }
        }
        Self::default()
    }

    /// Save config to file
    pub fn save(&self) {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    error!("Failed to create config directory: {}", e);
                    return;
                }
            }

            match serde_json::to_string_pretty(self) {
                Ok(content) => {
                    if let Err(e) = std::fs::write(&path, content) {
                        error!("Failed to save config: {}", e);
                    } else {
                        info!("Config saved to {:?}", path);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize config: {}", e);
                }
            }
        }
    }
}

/// Extract the server-reported `message` field from a response body, if any.
///
/// Both the session and the ping endpoints report failures as
/// `{ "message": "..." }`; that text takes priority over the raw HTTP status
/// when building error messages.
pub(crate) fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
}

/// Initialize logging (console + daily rolling file)
pub fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false);

    if let Some(log_dir) = log_dir() {
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "nodepay-keeper.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(non_blocking);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .init();

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_endpoints() {
        let config = AppConfig::default();
        assert_eq!(config.ping_url, "https://nw.nodepay.ai/api/network/ping");
        assert_eq!(config.session_url, "http://api.nodepay.ai/api/auth/session");
        assert_eq!(config.retry_interval, 3000);
        assert!(config.proxies_file.is_none());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"retryInterval": 5000, "sessionURL": "http://localhost/s"}"#)
                .unwrap();
        assert_eq!(config.retry_interval, 5000);
        assert_eq!(config.session_url, "http://localhost/s");
        assert_eq!(config.base_url, "https://nodepay.org");
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(r#"{"code": 403, "message": "token expired"}"#),
            Some("token expired".to_string())
        );
        assert_eq!(server_message(r#"{"message": ""}"#), None);
        assert_eq!(server_message(r#"{"code": 1}"#), None);
        assert_eq!(server_message("not json"), None);
    }
}
