//! SPA gateway library
//!
//! Serves a single-page application's static bundle and forwards `/api`
//! requests to a fixed upstream backend, so the browser sees one origin
//! for both the UI and its data API.

pub mod config;
pub mod http;
pub mod logger;
pub mod proxy;
pub mod router;
pub mod server;
