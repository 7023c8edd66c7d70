// Application state module
// Immutable per-process state shared by every connection

use super::types::Config;
use crate::proxy::ProxyRelay;
use crate::router::StaticFiles;

/// Shared application state, fixed at startup
///
/// Requests never mutate this; per-request data stays on the request's
/// own task.
pub struct AppState {
    pub config: Config,
    pub static_files: StaticFiles,
    pub relay: ProxyRelay,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            static_files: StaticFiles::new(&config.static_site),
            relay: ProxyRelay::new(&config.upstream),
            config: config.clone(),
        }
    }
}
