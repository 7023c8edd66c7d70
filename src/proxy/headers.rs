//! Proxy header filtering module
//!
//! The outbound request carries an allow-listed subset of the incoming
//! headers, so hop-specific headers (host, connection, cookies) never
//! reach the upstream. Hop-by-hop headers coming back from the upstream
//! are stripped before the response is relayed.

use hyper::header::{
    HeaderMap, HeaderName, ACCEPT, AUTHORIZATION, CONNECTION, CONTENT_TYPE, TRANSFER_ENCODING,
};

/// Copy the forwardable subset of incoming request headers
///
/// Only `Content-Type`, `Authorization` and `Accept` cross the proxy
/// boundary; everything else is dropped.
pub fn filter_request_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut filtered = HeaderMap::new();
    for name in [CONTENT_TYPE, AUTHORIZATION, ACCEPT] {
        if let Some(value) = incoming.get(&name) {
            let value = value.clone();
            filtered.insert(name, value);
        }
    }
    filtered
}

/// Hop-by-hop headers that must be re-negotiated by this layer,
/// never inherited from the upstream response
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == TRANSFER_ENCODING || *name == CONNECTION
}
