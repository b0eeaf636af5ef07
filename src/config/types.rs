// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
    /// Only used for the startup banner
    #[serde(default)]
    pub tunnel: TunnelConfig,
}

/// Listener configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Static asset root (the dashboard build output)
#[derive(Debug, Deserialize, Clone)]
pub struct StaticFilesConfig {
    pub root: String,
    pub index_files: Vec<String>,
}

/// Backend service that reserved-prefix requests are forwarded to
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL without trailing path, e.g. `http://127.0.0.1:8010`
    pub base_url: String,
    /// Reserved request-target prefix, e.g. `/api/`
    pub prefix: String,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub access_log: bool,
    /// Access log format (default, combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

/// External tunnel hint printed at startup
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TunnelConfig {
    #[serde(default)]
    pub hostname: Option<String>,
}
