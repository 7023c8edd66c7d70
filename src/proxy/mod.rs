//! Proxy relay module
//!
//! Forwards API-prefixed requests to the fixed upstream backend,
//! relaying exactly one response per request.

pub mod headers;
pub mod relay;

// Re-export main entry points
pub use relay::{declared_content_length, ProxyRelay, RelayOutcome};
