//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub kernel: KernelConfig,

    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix the app is mounted under behind a proxy. When unset it is taken
    /// from the `script-name` / `x-script-name` request headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_path: Option<String>,

    /// Responses smaller than this many bytes are sent uncompressed.
    #[serde(default = "default_gzip_min_size")]
    pub gzip_min_size: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root_path: None,
            gzip_min_size: default_gzip_min_size(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8765
}

fn default_gzip_min_size() -> u16 {
    1000
}

/// Session cookie configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// Cookie expiry as seconds since the Unix epoch.
    #[serde(default = "default_cookie_expires")]
    pub cookie_expires: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            cookie_expires: default_cookie_expires(),
        }
    }
}

fn default_cookie_name() -> String {
    "portico-session-id".to_string()
}

/// Fri, 01 Jan 2038 00:00:00 GMT
fn default_cookie_expires() -> i64 {
    2_145_916_800
}

/// Kernel worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KernelConfig {
    /// Upper bound on concurrently running kernel worker threads.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Seconds to wait for kernel threads still running after the server
    /// stopped before the process exits anyway.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

fn default_max_workers() -> usize {
    512
}

fn default_shutdown_grace_secs() -> u64 {
    5
}

/// WebSocket configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSocketConfig {
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: default_max_message_size(),
        }
    }
}

fn default_max_message_size() -> usize {
    64 << 20
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for the daily rolling log files.
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Emit console logs as JSON.
    #[serde(default)]
    pub json: bool,

    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: default_log_directory(),
            json: false,
            max_log_files: default_max_log_files(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

fn default_log_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".portico")
        .join("logs")
}

fn default_max_log_files() -> usize {
    7
}

/// Default location of the config file: `~/.portico/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".portico")
        .join("config.toml")
}
