//! HTTP protocol layer module
//!
//! Protocol-level helpers decoupled from business logic, shared between
//! static file serving and the proxy relay.

pub mod cache;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used items
pub use range::{resolve_range, ByteRange};
pub use response::{
    build_304_response, build_404_response, build_413_response, build_416_response,
    build_502_response, build_file_response, build_partial_response,
};
