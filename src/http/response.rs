//! HTTP response building module
//!
//! Builders for locally generated responses. Every builder returns a
//! complete response, so no code path can leave a connection half-answered.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
};
use hyper::{Response, StatusCode};

const STATIC_CACHE_CONTROL: &str = "public, max-age=3600";

type LocalResponse = Response<Full<Bytes>>;

/// Finish a builder, degrading to a bare empty response if it was fed
/// an invalid header value
fn or_empty(result: Result<LocalResponse, hyper::http::Error>, context: &str) -> LocalResponse {
    result.unwrap_or_else(|e| {
        crate::logger::log_error(&format!("Failed to build {context} response: {e}"));
        Response::new(Full::new(Bytes::new()))
    })
}

/// 404 Not Found, empty body
pub fn build_404_response() -> LocalResponse {
    or_empty(
        Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Full::new(Bytes::new())),
        "404",
    )
}

/// 413 Payload Too Large
pub fn build_413_response() -> LocalResponse {
    or_empty(
        Response::builder()
            .status(StatusCode::PAYLOAD_TOO_LARGE)
            .header(CONTENT_TYPE, "text/plain")
            .body(Full::new(Bytes::from_static(b"413 Payload Too Large"))),
        "413",
    )
}

/// Synthesized 502 Bad Gateway
///
/// Body is a single-field JSON object describing the transport failure.
pub fn build_502_response(message: &str) -> LocalResponse {
    let payload = serde_json::json!({ "error": message }).to_string();
    or_empty(
        Response::builder()
            .status(StatusCode::BAD_GATEWAY)
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(payload))),
        "502",
    )
}

/// 304 Not Modified for a matching `ETag`
pub fn build_304_response(etag: &str) -> LocalResponse {
    or_empty(
        Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(ETAG, etag)
            .header(CACHE_CONTROL, STATIC_CACHE_CONTROL)
            .body(Full::new(Bytes::new())),
        "304",
    )
}

/// 200 with a static file's full content
pub fn build_file_response(data: Bytes, content_type: &str, etag: &str) -> LocalResponse {
    let len = data.len();
    or_empty(
        Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, len)
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, STATIC_CACHE_CONTROL)
            .body(Full::new(data)),
        "200",
    )
}

/// 206 with one byte window of a static file
pub fn build_partial_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    start: usize,
    end: usize,
    total_size: usize,
) -> LocalResponse {
    or_empty(
        Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(CONTENT_TYPE, content_type)
            .header(CONTENT_LENGTH, end - start + 1)
            .header(CONTENT_RANGE, format!("bytes {start}-{end}/{total_size}"))
            .header(ACCEPT_RANGES, "bytes")
            .header(ETAG, etag)
            .header(CACHE_CONTROL, STATIC_CACHE_CONTROL)
            .body(Full::new(data)),
        "206",
    )
}

/// 416 when the requested window lies outside the file
pub fn build_416_response(file_size: usize) -> LocalResponse {
    or_empty(
        Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(CONTENT_RANGE, format!("bytes */{file_size}"))
            .body(Full::new(Bytes::new())),
        "416",
    )
}
