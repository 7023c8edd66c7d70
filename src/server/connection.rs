// Connection handling module
// Serves one accepted TCP connection to completion

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;

use crate::config::AppState;
use crate::logger;
use crate::router;

/// Admit a connection and spawn its serving task
///
/// The counter is incremented before the limit check so a burst of
/// accepts cannot race past the configured maximum.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    let active = conn_counter.fetch_add(1, Ordering::SeqCst);
    if let Some(max_conn) = state.config.performance.max_connections {
        if active >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Connection limit reached ({active}/{max_conn}), rejecting {peer_addr}"
            ));
            return;
        }
    }

    if state.config.logging.access_log {
        logger::log_connection_accepted(&peer_addr);
    }

    let state = Arc::clone(state);
    let conn_counter = Arc::clone(conn_counter);
    tokio::task::spawn_local(async move {
        serve_connection(stream, peer_addr, &state).await;
        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Serve HTTP/1.1 on the connection until it closes or times out
///
/// Requests on this connection are handled to completion sequentially;
/// requests on distinct connections are independent of each other.
async fn serve_connection(stream: TcpStream, peer_addr: SocketAddr, state: &Arc<AppState>) {
    let perf = &state.config.performance;
    let conn_deadline = Duration::from_secs(perf.read_timeout.max(perf.write_timeout));

    let mut builder = http1::Builder::new();
    builder.keep_alive(perf.keep_alive_timeout > 0);

    let service_state = Arc::clone(state);
    let service = service_fn(move |req| {
        let state = Arc::clone(&service_state);
        router::handle_request(req, state, peer_addr)
    });

    let serving = builder.serve_connection(TokioIo::new(stream), service);
    match tokio::time::timeout(conn_deadline, serving).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => logger::log_connection_error(&err),
        Err(_) => logger::log_warning(&format!(
            "Connection from {peer_addr} timed out after {}s",
            conn_deadline.as_secs()
        )),
    }
}
