// Server loop module
// Accepts connections until shutdown, then drains them

use std::future::Future;
use std::sync::Arc;

use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;

use super::connection::handle_connection;
use super::{ServeOptions, Server};
use crate::logger;

/// Accept loop of one listener.
///
/// When `shutdown` resolves the listener is closed first, then open
/// connections get `options.shutdown_grace` to finish.
pub async fn run<F>(server: Arc<Server>, listener: TcpListener, options: ServeOptions, shutdown: F)
where
    F: Future<Output = ()>,
{
    let graceful = GracefulShutdown::new();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        handle_connection(stream, peer_addr, &server, &options, &graceful);
                    }
                    Err(e) => logger::log_accept_error(&e),
                }
            }

            () = &mut shutdown => break,
        }
    }

    logger::log_shutdown_requested(options.shutdown_grace);
    drop(listener);

    let drained = tokio::select! {
        () = graceful.shutdown() => true,
        () = tokio::time::sleep(options.shutdown_grace) => false,
    };
    logger::log_shutdown_complete(drained);
}
