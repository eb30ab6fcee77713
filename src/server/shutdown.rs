// Shutdown module
// Stop signal shared by the accept loop and every connection task

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::logger;

/// Poll interval while waiting for open connections to finish
const DRAIN_POLL: Duration = Duration::from_millis(25);

/// Cloneable trigger that stops a running [`super::Server`]
#[derive(Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub(super) fn new() -> Self {
        Self {
            tx: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Ask the server to stop accepting and wind down open connections
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    pub(super) fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

/// Wait until every connection task has finished or `grace` has elapsed.
///
/// Returns the number of connections still open at the deadline; those
/// tasks keep running until the runtime shuts down.
pub async fn drain_connections(conn_counter: &AtomicUsize, grace: Duration) -> usize {
    let deadline = tokio::time::Instant::now() + grace;

    loop {
        let open = conn_counter.load(Ordering::SeqCst);
        if open == 0 {
            return 0;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "{open} connection(s) still open after {}s grace period",
                grace.as_secs()
            ));
            return open;
        }
        tokio::time::sleep(DRAIN_POLL).await;
    }
}
