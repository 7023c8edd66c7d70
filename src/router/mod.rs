//! Request router module
//!
//! Classifies each incoming request and dispatches it to the static
//! bundle responder or the proxy relay.

pub mod dispatch;
pub mod static_files;

// Re-export main entry points
pub use dispatch::{classify, handle_request, RouteClass};
pub use static_files::{Conditions, Resolved, StaticFiles};
