// Connection handling module
// Serves a single accepted TCP connection

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpStream;

use super::{ServeOptions, Server};
use crate::handler;
use crate::logger;

/// Handle a single connection in a spawned task.
///
/// The connection is registered with `graceful` so that shutdown waits for
/// its in-flight request. Only reading the request head is timed out.
pub fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    server: &Arc<Server>,
    options: &ServeOptions,
    graceful: &GracefulShutdown,
) {
    let io = TokioIo::new(stream);
    let server = Arc::clone(server);

    let mut builder = http1::Builder::new();
    builder
        .timer(TokioTimer::new())
        .header_read_timeout(options.read_header_timeout)
        .keep_alive(true);

    let conn = builder.serve_connection(
        io,
        service_fn(move |req| {
            let server = Arc::clone(&server);
            async move { Ok::<_, Infallible>(handler::handle_request(req, &server).await) }
        }),
    );
    let conn = graceful.watch(conn);

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            logger::log_connection_error(&peer_addr, &err);
        }
    });
}
