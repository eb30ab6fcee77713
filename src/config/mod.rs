// Configuration module entry point
// Loads layered configuration and resolves the served root directory

mod state;
mod types;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::StartupError;

// Re-export public types
pub use state::AppState;
pub use types::{Config, HttpConfig, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file name (without extension), looked up in the working directory
pub const DEFAULT_CONFIG_NAME: &str = "static_game_server";

impl Config {
    /// Load configuration from the default file name in the working directory
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(DEFAULT_CONFIG_NAME)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// A missing file is not an error; built-in defaults fill every key.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, StartupError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| StartupError::Address(format!("{}:{}: {e}", self.server.host, self.server.port)))
    }

    /// Resolve the served root once: the configured path, or the directory
    /// containing the running executable. The result is canonical.
    pub fn resolve_root(&self) -> Result<PathBuf, StartupError> {
        let candidate = match self.server.root.as_deref() {
            Some(root) => PathBuf::from(root),
            None => executable_dir()?,
        };
        canonical_dir(&candidate)
    }
}

fn executable_dir() -> Result<PathBuf, StartupError> {
    let exe = std::env::current_exe().map_err(|source| StartupError::Root {
        path: PathBuf::from("<current executable>"),
        source,
    })?;
    match exe.parent() {
        Some(dir) => Ok(dir.to_path_buf()),
        None => Err(StartupError::RootNotDirectory(exe)),
    }
}

fn canonical_dir(path: &Path) -> Result<PathBuf, StartupError> {
    let canonical = path.canonicalize().map_err(|source| StartupError::Root {
        path: path.to_path_buf(),
        source,
    })?;
    if !canonical.is_dir() {
        return Err(StartupError::RootNotDirectory(canonical));
    }
    Ok(canonical)
}
