// Server module entry point
// Binds the listener, owns shared state and runs the accept loop

pub mod connection;
pub mod listener;
pub mod server_loop;
pub mod shutdown;
pub mod signal;

use std::net::SocketAddr;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::config::{AppState, Config};
use crate::error::StartupError;

pub use listener::create_listener;
pub use shutdown::ShutdownHandle;

/// A bound, not yet running, static file server.
///
/// Everything it needs comes from the `Config` passed to [`Server::bind`],
/// so several servers can live in one process.
pub struct Server {
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: ShutdownHandle,
}

impl Server {
    /// Resolve the root directory and bind the listening socket.
    ///
    /// Fails when the address is invalid, the root is missing or not a
    /// directory, or the port cannot be bound.
    pub async fn bind(config: &Config) -> Result<Self, StartupError> {
        let addr = config.get_socket_addr()?;
        let root = config.resolve_root()?;
        let listener = create_listener(addr).map_err(|source| StartupError::Bind { addr, source })?;

        Ok(Self {
            listener,
            state: Arc::new(AppState::new(config, root)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            shutdown: ShutdownHandle::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub const fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Handle that stops [`Server::run`] from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Serve until the shutdown handle fires.
    pub async fn run(self) {
        let rx = self.shutdown.subscribe();
        server_loop::start_server_loop(self.listener, self.state, self.active_connections, rx).await;
    }
}
