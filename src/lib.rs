//! Static file server for small browser games.
//!
//! Serves one root directory over HTTP/1.1: `/` returns the index file,
//! any other path returns the file it names under the root, and anything
//! that is missing or would escape the root is a 404.
//!
//! ```no_run
//! use static_game_server::{Config, Server};
//!
//! # async fn demo() -> Result<(), static_game_server::StartupError> {
//! let mut config = Config::default();
//! config.server.root = Some("/home/pi/flappy-bird".to_string());
//! let server = Server::bind(&config).await?;
//! server.run().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::Config;
pub use error::StartupError;
pub use server::{Server, ShutdownHandle};
