// Server loop module
// Accepts connections until the shutdown signal, then drains

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use super::shutdown::drain_connections;
use crate::config::AppState;
use crate::logger;

/// Back-off after a failed `accept` (e.g. file descriptor exhaustion)
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(50);

/// Accept loop: one task per connection until `shutdown` turns `true`.
///
/// After the signal the listener is closed first, so new clients are refused
/// while open connections get `performance.shutdown_grace` to finish.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: watch::Receiver<bool>,
) {
    let mut stop_rx = shutdown.clone();

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            shutdown.clone(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                }
            }

            () = wait_for_stop(&mut stop_rx) => break,
        }
    }

    logger::log_info("Shutdown requested, closing listener");
    drop(listener);

    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    drain_connections(&active_connections, grace).await;
}

/// Resolve once `rx` reads `true`, or its sender is gone.
///
/// The `watch::Ref` is dropped here so no lock guard lives in the caller's
/// future.
pub(super) async fn wait_for_stop(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|&stop| stop).await;
}
