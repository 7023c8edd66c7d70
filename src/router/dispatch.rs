//! Request routing dispatch module
//!
//! Entry point for request processing: classifies each request before any
//! bytes are written, then dispatches to the static bundle or the relay.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use http_body_util::Full;
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::http;
use crate::logger::{self, AccessLogEntry, Handled};
use crate::proxy::{declared_content_length, RelayOutcome};
use crate::router::static_files::{Conditions, Resolved};

/// Request handling class, decided from method and path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Forward to the upstream backend
    Proxy,
    /// Serve from the bundle (GET only)
    StaticAsset,
    /// No handler for this method/path combination
    Unsupported,
}

/// Classify an incoming request
///
/// API-prefixed paths are proxy-enabled for the five data verbs only;
/// any other method there is a local 404 rather than a 405. A bare
/// prefix with no further segments still proxies.
pub fn classify(method: &Method, path: &str, api_prefix: &str) -> RouteClass {
    if path.starts_with(api_prefix) {
        return match *method {
            Method::GET | Method::POST | Method::PUT | Method::DELETE | Method::PATCH => {
                RouteClass::Proxy
            }
            _ => RouteClass::Unsupported,
        };
    }
    if *method == Method::GET {
        RouteClass::StaticAsset
    } else {
        RouteClass::Unsupported
    }
}

/// Main entry point for request handling
///
/// Every path through here produces exactly one complete response.
pub async fn handle_request(
    req: Request<Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(ToString::to_string);
    let referer = header_value(req.headers(), "referer");
    let user_agent = header_value(req.headers(), "user-agent");

    let class = classify(&method, &path, &state.config.upstream.api_prefix);

    let (response, handled) = match class {
        RouteClass::Proxy => {
            if let Some(resp) = check_body_size(req.headers(), state.config.http.max_body_size) {
                (resp, Handled::Proxy)
            } else {
                let outcome = state.relay.forward(req).await;
                if let RelayOutcome::TransportFailure(ref message) = outcome {
                    logger::log_upstream_failure(method.as_str(), &path, message);
                }
                (outcome.into_response(), Handled::Proxy)
            }
        }
        RouteClass::StaticAsset => {
            let cond = Conditions {
                if_none_match: header_value(req.headers(), "if-none-match"),
                range: header_value(req.headers(), "range"),
            };
            match state.static_files.resolve(&path) {
                Resolved::File(file) | Resolved::DirWithIndex(file) => (
                    state.static_files.serve_file(&file, &cond).await,
                    Handled::Static,
                ),
                Resolved::NotFound => (
                    state.static_files.serve_entry_document(&cond).await,
                    Handled::SpaFallback,
                ),
            }
        }
        RouteClass::Unsupported => (http::build_404_response(), Handled::Unmatched),
    };

    if state.config.logging.access_log {
        let mut entry = AccessLogEntry::new(peer_addr.ip().to_string(), method.to_string(), path);
        entry.query = query;
        entry.status = response.status().as_u16();
        entry.body_bytes =
            usize::try_from(response.body().size_hint().exact().unwrap_or(0)).unwrap_or(0);
        entry.handled = handled;
        entry.referer = referer;
        entry.user_agent = user_agent;
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

/// Extract a header as an owned string, ignoring non-UTF8 values
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Reject oversized declared bodies before buffering them
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let declared = declared_content_length(headers);
    if declared > max_body_size {
        logger::log_warning(&format!(
            "Request body too large: {declared} bytes (max: {max_body_size})"
        ));
        return Some(http::build_413_response());
    }
    None
}
