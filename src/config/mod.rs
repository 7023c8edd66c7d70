// Configuration module entry point
// Loads the startup configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig, StaticSiteConfig,
    UpstreamConfig,
};

impl Config {
    /// Load configuration from `gateway.toml` (if present) and
    /// `GATEWAY_*` environment variables, falling back to defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("gateway").required(false))
            .add_source(config::Environment::with_prefix("GATEWAY"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8888)?
            .set_default("static_site.root", "frontend/dist")?
            .set_default("static_site.entry_document", "index.html")?
            .set_default("upstream.base_url", "http://127.0.0.1:3001")?
            .set_default("upstream.api_prefix", "/api")?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.max_body_size", 10_485_760)? // 10MB
            .build()?;

        settings.try_deserialize()
    }

    /// Socket address the gateway binds to
    pub fn socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::load().expect("default configuration must load");
        assert_eq!(cfg.upstream.api_prefix, "/api");
        assert_eq!(cfg.upstream.timeout_secs, 30);
        assert_eq!(cfg.static_site.entry_document, "index.html");
        assert_eq!(cfg.server.port, 8888);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load().expect("default configuration must load");
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 9000;
        let addr = cfg.socket_addr().expect("address must parse");
        assert_eq!(addr.port(), 9000);
    }
}
