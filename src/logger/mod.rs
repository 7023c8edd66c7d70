//! Logger module
//!
//! Server lifecycle, access and error logging. Output goes to
//! stdout/stderr until [`init`] points it at configured files.

mod format;
pub mod writer;

pub use format::{AccessLogEntry, Handled};

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write to info/access log
fn write_info(message: &str) {
    writer::access_line(message);
}

/// Write to error log
fn write_error(message: &str) {
    writer::error_line(message);
}

/// Write to access log specifically
fn write_access(message: &str) {
    writer::access_line(message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    write_info(&format!("spa_gateway listening on http://{addr}"));
    write_info(&format!("  bundle root: {}", config.static_site.root));
    write_info(&format!(
        "  proxying {} -> {}",
        config.upstream.api_prefix, config.upstream.base_url
    ));
    write_info(&format!("  log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        write_info(&format!("  worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        write_info(&format!("  access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        write_info(&format!("  error log: {path}"));
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    write_info(&format!("[conn] accepted {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    write_error(&format!("[conn] serve error: {err:?}"));
}

pub fn log_error(message: &str) {
    write_error(&format!("[error] {message}"));
}

pub fn log_warning(message: &str) {
    write_error(&format!("[warn] {message}"));
}

/// Log a formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.format(format));
}

/// Log an upstream transport failure that was converted into a 502
pub fn log_upstream_failure(method: &str, path: &str, message: &str) {
    write_error(&format!("[upstream] {method} {path} failed: {message}"));
}
