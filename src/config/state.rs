// Application state module
// Immutable per-server state shared by every connection task

use std::path::{Path, PathBuf};

use super::types::Config;
use crate::http::cache::CachePolicy;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Canonical root directory, resolved once at startup
    root: PathBuf,
    cache_policy: CachePolicy,
    access_log: bool,
}

impl AppState {
    /// Create `AppState` for a resolved, canonical root directory
    pub fn new(config: &Config, root: PathBuf) -> Self {
        let cache_policy = config
            .http
            .cache_max_age
            .map_or(CachePolicy::NoCache, CachePolicy::Public);

        Self {
            config: config.clone(),
            root,
            cache_policy,
            access_log: config.logging.access_log,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index_file(&self) -> &str {
        &self.config.http.index_file
    }

    pub const fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    pub const fn access_log_enabled(&self) -> bool {
        self.access_log
    }
}
