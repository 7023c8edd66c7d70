//! Proxy relay module
//!
//! Forwards one classified request to the fixed upstream and relays
//! exactly one response back. Transport-level failures are converted
//! into synthesized 502 responses, never left half-answered.

use std::time::Duration;

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::http::request;
use hyper::{Request, Response, StatusCode, Uri};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use super::headers::{filter_request_headers, is_hop_by_hop};
use crate::config::UpstreamConfig;
use crate::http::build_502_response;
use crate::logger;

/// Result of one relay attempt
#[derive(Debug)]
pub enum RelayOutcome {
    /// Upstream answered with a non-error status
    Success {
        status: StatusCode,
        headers: HeaderMap,
        body: Bytes,
    },
    /// Upstream answered, but with a 4xx/5xx
    UpstreamError { status: StatusCode, body: Bytes },
    /// The round trip itself failed (connect, DNS, timeout, bad response)
    TransportFailure(String),
}

impl RelayOutcome {
    /// Map the outcome to the one response relayed to the original caller
    pub fn into_response(self) -> Response<Full<Bytes>> {
        match self {
            Self::Success {
                status,
                headers,
                body,
            } => {
                let mut builder = Response::builder().status(status);
                if let Some(relayed) = builder.headers_mut() {
                    for (name, value) in &headers {
                        if !is_hop_by_hop(name) {
                            relayed.append(name.clone(), value.clone());
                        }
                    }
                }
                builder.body(Full::new(body)).unwrap_or_else(|e| {
                    logger::log_error(&format!("Failed to build relayed response: {e}"));
                    build_502_response("invalid upstream response")
                })
            }
            // Error payloads are relayed as JSON regardless of what the
            // upstream declared
            Self::UpstreamError { status, body } => Response::builder()
                .status(status)
                .header(CONTENT_TYPE, "application/json")
                .body(Full::new(body))
                .unwrap_or_else(|e| {
                    logger::log_error(&format!("Failed to build relayed error: {e}"));
                    build_502_response("invalid upstream response")
                }),
            Self::TransportFailure(message) => build_502_response(&message),
        }
    }
}

/// Relay to the single fixed upstream
pub struct ProxyRelay {
    client: Client<HttpConnector, Full<Bytes>>,
    base_url: String,
    timeout: Duration,
}

impl ProxyRelay {
    pub fn new(config: &UpstreamConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Forward one request to the upstream
    ///
    /// The incoming body is read exactly once, entirely, before dispatch.
    /// No declared `Content-Length` (or zero) means no body; chunked
    /// request bodies are not supported.
    pub async fn forward<B>(&self, req: Request<B>) -> RelayOutcome
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let buffered = if declared_content_length(&parts.headers) > 0 {
            match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    return RelayOutcome::TransportFailure(format!(
                        "failed to read request body: {e}"
                    ));
                }
            }
        } else {
            Bytes::new()
        };
        self.exchange(&parts, buffered).await
    }

    /// Send the buffered request and collect the upstream's full response
    ///
    /// The original path and query are appended to the upstream base
    /// verbatim; the upstream must itself understand the prefixed path.
    pub async fn exchange(&self, parts: &request::Parts, body: Bytes) -> RelayOutcome {
        let path_and_query = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), ToString::to_string);
        let target = format!("{}{}", self.base_url, path_and_query);
        let uri: Uri = match target.parse() {
            Ok(uri) => uri,
            Err(e) => {
                return RelayOutcome::TransportFailure(format!(
                    "invalid upstream target '{target}': {e}"
                ));
            }
        };

        let mut builder = Request::builder().method(parts.method.clone()).uri(uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = filter_request_headers(&parts.headers);
        }
        let outbound = match builder.body(Full::new(body)) {
            Ok(outbound) => outbound,
            Err(e) => {
                return RelayOutcome::TransportFailure(format!(
                    "failed to build upstream request: {e}"
                ));
            }
        };

        // One bounded round trip, no retries
        match tokio::time::timeout(self.timeout, self.round_trip(outbound)).await {
            Ok(outcome) => outcome,
            Err(_) => RelayOutcome::TransportFailure(format!(
                "upstream timed out after {}s",
                self.timeout.as_secs()
            )),
        }
    }

    async fn round_trip(&self, outbound: Request<Full<Bytes>>) -> RelayOutcome {
        let response = match self.client.request(outbound).await {
            Ok(response) => response,
            Err(e) => return RelayOutcome::TransportFailure(e.to_string()),
        };
        let (parts, body) = response.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                return RelayOutcome::TransportFailure(format!(
                    "failed to read upstream response: {e}"
                ));
            }
        };
        if parts.status.is_client_error() || parts.status.is_server_error() {
            RelayOutcome::UpstreamError {
                status: parts.status,
                body,
            }
        } else {
            RelayOutcome::Success {
                status: parts.status,
                headers: parts.headers,
                body,
            }
        }
    }
}

/// Declared request body size; absent or malformed counts as zero
pub fn declared_content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::body::Incoming;
    use hyper::header::HeaderValue;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::Method;
    use hyper_util::rt::TokioIo;
    use std::convert::Infallible;
    use std::net::SocketAddr;

    fn relay_for(base_url: &str, timeout_secs: u64) -> ProxyRelay {
        ProxyRelay::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            api_prefix: "/api".to_string(),
            timeout_secs,
        })
    }

    fn request_parts(method: Method, target: &str) -> request::Parts {
        let (parts, ()) = Request::builder()
            .method(method)
            .uri(target)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    /// Upstream that echoes method, target and body, and reports whether
    /// non-allow-listed headers leaked through the proxy boundary.
    async fn spawn_echo_upstream(status: u16) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let service = service_fn(move |req: Request<Incoming>| async move {
                        let method = req.method().clone();
                        let uri = req.uri().clone();
                        let leaked = req.headers().contains_key("x-internal-secret");
                        let typed = req.headers().contains_key("content-type");
                        let body = req.into_body().collect().await.unwrap().to_bytes();
                        let payload = format!(
                            "{method} {uri} leaked={leaked} typed={typed} {}",
                            String::from_utf8_lossy(&body)
                        );
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .header("x-ticket-store", "v1")
                                .body(Full::new(Bytes::from(payload)))
                                .unwrap(),
                        )
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), service)
                        .await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_forwards_path_body_and_filtered_headers() {
        let addr = spawn_echo_upstream(201).await;
        let relay = relay_for(&format!("http://{addr}"), 5);

        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/tickets?sort=desc")
            .header("content-type", "application/json")
            .header("content-length", "13")
            .header("x-internal-secret", "leak-me")
            .body(Full::new(Bytes::from(r#"{"title":"x"}"#)))
            .unwrap();

        match relay.forward(req).await {
            RelayOutcome::Success {
                status,
                headers,
                body,
            } => {
                assert_eq!(status, StatusCode::CREATED);
                assert_eq!(
                    headers.get("x-ticket-store").unwrap(),
                    &HeaderValue::from_static("v1")
                );
                let echoed = String::from_utf8_lossy(&body).into_owned();
                assert!(echoed.starts_with("POST /api/tickets?sort=desc"), "{echoed}");
                assert!(echoed.contains("leaked=false"), "{echoed}");
                assert!(echoed.contains("typed=true"), "{echoed}");
                assert!(echoed.ends_with(r#"{"title":"x"}"#), "{echoed}");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_classified() {
        let addr = spawn_echo_upstream(503).await;
        let relay = relay_for(&format!("http://{addr}"), 5);
        let parts = request_parts(Method::GET, "/api/health");

        match relay.exchange(&parts, Bytes::new()).await {
            RelayOutcome::UpstreamError { status, .. } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_becomes_502() {
        // Bind then drop to get a port with nothing listening
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let relay = relay_for(&format!("http://{addr}"), 2);
        let parts = request_parts(Method::GET, "/api/items");
        let outcome = relay.exchange(&parts, Bytes::new()).await;
        assert!(matches!(&outcome, RelayOutcome::TransportFailure(_)));

        let resp = outcome.into_response();
        assert_eq!(resp.status(), 502);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(parsed["error"].is_string());
    }

    #[tokio::test]
    async fn test_silent_upstream_times_out_as_502() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold connections open without answering
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let relay = relay_for(&format!("http://{addr}"), 1);
        let parts = request_parts(Method::GET, "/api/slow");
        match relay.exchange(&parts, Bytes::new()).await {
            RelayOutcome::TransportFailure(message) => {
                assert!(message.contains("timed out"), "{message}");
            }
            other => panic!("expected transport failure, got {other:?}"),
        }
    }

    #[test]
    fn test_hop_by_hop_headers_never_relayed() {
        let mut headers = HeaderMap::new();
        headers.insert("x-upstream", HeaderValue::from_static("1"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        let outcome = RelayOutcome::Success {
            status: StatusCode::OK,
            headers,
            body: Bytes::from_static(b"ok"),
        };

        let resp = outcome.into_response();
        assert!(resp.headers().contains_key("x-upstream"));
        assert!(!resp.headers().contains_key("transfer-encoding"));
        assert!(!resp.headers().contains_key("connection"));
    }

    #[test]
    fn test_upstream_error_relayed_as_json() {
        let outcome = RelayOutcome::UpstreamError {
            status: StatusCode::NOT_FOUND,
            body: Bytes::from_static(b"{\"detail\":\"missing\"}"),
        };
        let resp = outcome.into_response();
        assert_eq!(resp.status(), 404);
        assert_eq!(
            resp.headers().get("content-type").unwrap(),
            &HeaderValue::from_static("application/json")
        );
    }

    #[test]
    fn test_declared_content_length() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_content_length(&headers), 0);
        headers.insert("content-length", HeaderValue::from_static("13"));
        assert_eq!(declared_content_length(&headers), 13);
        headers.insert("content-length", HeaderValue::from_static("junk"));
        assert_eq!(declared_content_length(&headers), 0);
    }
}
