//! Startup error type
//!
//! Request handling never fails outward (every failure becomes a status
//! response), so the only typed errors are the ones that stop the process
//! before it starts serving.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug)]
pub enum StartupError {
    /// Configuration sources could not be read or deserialized
    Config(config::ConfigError),
    /// `host:port` does not form a socket address
    Address(String),
    /// Root directory missing or not accessible
    Root { path: PathBuf, source: std::io::Error },
    /// Root exists but is not a directory
    RootNotDirectory(PathBuf),
    /// Listener could not be created (port in use, permission denied)
    Bind { addr: SocketAddr, source: std::io::Error },
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Address(msg) => write!(f, "invalid address: {msg}"),
            Self::Root { path, source } => {
                write!(f, "root directory '{}' is not accessible: {source}", path.display())
            }
            Self::RootNotDirectory(path) => {
                write!(f, "root '{}' is not a directory", path.display())
            }
            Self::Bind { addr, source } => write!(f, "failed to bind {addr}: {source}"),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Root { source, .. } | Self::Bind { source, .. } => Some(source),
            Self::Address(_) | Self::RootNotDirectory(_) => None,
        }
    }
}

impl From<config::ConfigError> for StartupError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_mentions_path() {
        let err = StartupError::RootNotDirectory(PathBuf::from("/srv/game/index.html"));
        assert_eq!(err.to_string(), "root '/srv/game/index.html' is not a directory");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_bind_error_has_source() {
        let err = StartupError::Bind {
            addr: "0.0.0.0:5000".parse().unwrap(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        assert!(err.to_string().starts_with("failed to bind 0.0.0.0:5000"));
        assert!(err.source().is_some());
    }
}
