// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub static_site: StaticSiteConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Static bundle configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StaticSiteConfig {
    /// Directory holding the built SPA bundle
    pub root: String,
    /// Entry document served for client-side routed URLs
    #[serde(default = "default_entry_document")]
    pub entry_document: String,
}

fn default_entry_document() -> String {
    "index.html".to_string()
}

/// Upstream backend configuration
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base address every proxied request is issued against,
    /// e.g. `http://127.0.0.1:3001`
    pub base_url: String,
    /// Path prefix that selects the proxy instead of the static bundle
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Round-trip timeout for one proxied request
    #[serde(default = "default_upstream_timeout")]
    pub timeout_secs: u64,
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

const fn default_upstream_timeout() -> u64 {
    30
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, or json)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}
