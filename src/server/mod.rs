// Server module entry point
// Accept loop, per-connection tasks and shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::handler::{Dispatcher, StaticFiles};
use crate::logger;

pub use listener::create_reusable_listener;

/// Accept connections until `shutdown` resolves, then close the listener.
///
/// Each connection is served in its own task; accept errors are logged and
/// the loop keeps going.
pub async fn serve<S, F>(listener: TcpListener, dispatcher: Arc<Dispatcher<S>>, shutdown: F)
where
    S: StaticFiles,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::handle_connection(stream, peer_addr, Arc::clone(&dispatcher));
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = &mut shutdown => {
                logger::log_shutdown();
                break;
            }
        }
    }

    drop(listener);
}
