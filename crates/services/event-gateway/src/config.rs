//! Configuration for the NVR Event Gateway
//!
//! Configuration is loaded from a JSON (default `config.json`) or TOML file
//! and then overridden by `NVR_*` environment variables. A missing file means
//! defaults; an unreadable or malformed one is fatal.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// `log_file` value that sends logs to stdout instead of a file
pub const STDOUT_LOG: &str = "stdout";

/// Main configuration for the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen port
    #[serde(default = "default_server_port")]
    pub server_port: String,

    /// Interface to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Log file path, or `stdout`
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Forward sink target; empty disables forwarding
    #[serde(default)]
    pub notify_url: String,

    /// Forward sink request timeout in seconds
    #[serde(default = "default_sink_timeout")]
    pub forward_timeout_seconds: u64,

    /// Basic auth for all ingest routes; enforced only when both are set
    #[serde(default)]
    pub auth_username: String,
    #[serde(default)]
    pub auth_password: String,

    #[serde(default)]
    pub telegram_enabled: bool,
    #[serde(default)]
    pub telegram_token: String,
    #[serde(default)]
    pub telegram_chat_id: String,

    /// Bot API base URL
    #[serde(default = "default_telegram_api_base")]
    pub telegram_api_base: String,

    /// Telegram request timeout in seconds
    #[serde(default = "default_sink_timeout")]
    pub telegram_timeout_seconds: u64,

    /// Extra Basic auth for `/hikvision/alarm`
    #[serde(default)]
    pub hik_enabled: bool,
    #[serde(default)]
    pub hik_username: String,
    #[serde(default)]
    pub hik_password: String,
}

fn default_server_port() -> String {
    "8080".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_log_file() -> String {
    "nvr_events.log".to_string()
}

fn default_sink_timeout() -> u64 {
    10
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: default_server_port(),
            host: default_host(),
            log_file: default_log_file(),
            notify_url: String::new(),
            forward_timeout_seconds: default_sink_timeout(),
            auth_username: String::new(),
            auth_password: String::new(),
            telegram_enabled: false,
            telegram_token: String::new(),
            telegram_chat_id: String::new(),
            telegram_api_base: default_telegram_api_base(),
            telegram_timeout_seconds: default_sink_timeout(),
            hik_enabled: false,
            hik_username: String::new(),
            hik_password: String::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file; `.toml` is parsed as TOML, anything else as JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }

    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Load the file if it exists, then apply environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::from_env());
        }

        let mut config = Self::from_file(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `NVR_*` variables resolved by `lookup`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let strings: [(&str, &mut String); 11] = [
            ("NVR_SERVER_PORT", &mut self.server_port),
            ("NVR_HOST", &mut self.host),
            ("NVR_LOG_FILE", &mut self.log_file),
            ("NVR_NOTIFY_URL", &mut self.notify_url),
            ("NVR_AUTH_USERNAME", &mut self.auth_username),
            ("NVR_AUTH_PASSWORD", &mut self.auth_password),
            ("NVR_TELEGRAM_TOKEN", &mut self.telegram_token),
            ("NVR_TELEGRAM_CHAT_ID", &mut self.telegram_chat_id),
            ("NVR_TELEGRAM_API_BASE", &mut self.telegram_api_base),
            ("NVR_HIK_USERNAME", &mut self.hik_username),
            ("NVR_HIK_PASSWORD", &mut self.hik_password),
        ];
        for (key, field) in strings {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }

        let flags: [(&str, &mut bool); 2] = [
            ("NVR_TELEGRAM_ENABLED", &mut self.telegram_enabled),
            ("NVR_HIK_ENABLED", &mut self.hik_enabled),
        ];
        for (key, field) in flags {
            if let Some(value) = lookup(key) {
                *field = matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
            }
        }
    }

    /// Socket address built from `host` and `server_port`
    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        let port: u16 = self
            .server_port
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidPort(self.server_port.clone()))?;
        format!("{}:{}", self.host, port)
            .parse()
            .map_err(|e| ConfigError::InvalidAddress(format!("{}: {}", self.host, e)))
    }

    /// Global Basic auth is enforced only when both username and password are set
    pub fn auth_enabled(&self) -> bool {
        !self.auth_username.is_empty() && !self.auth_password.is_empty()
    }

    /// Vendor auth for `/hikvision/alarm`
    pub fn hik_auth_enabled(&self) -> bool {
        self.hik_enabled && !self.hik_username.is_empty()
    }

    /// Forward target, if configured
    pub fn forward_url(&self) -> Option<&str> {
        let url = self.notify_url.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn telegram_configured(&self) -> bool {
        self.telegram_enabled && !self.telegram_token.is_empty() && !self.telegram_chat_id.is_empty()
    }

    pub fn logs_to_stdout(&self) -> bool {
        self.log_file == STDOUT_LOG
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid server port: {0:?}")]
    InvalidPort(String),

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Failed to open log file: {0}")]
    LogFile(String),

    #[error("Failed to install log subscriber: {0}")]
    Logging(String),
}
