//! Sync server configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ServerError, ServerResult};

/// Environment variable naming the feed store directory.
pub const STORE_DIR_ENV: &str = "TODOFEED_STORE_DIR";

/// Environment variable setting the sync interval in seconds.
pub const SYNC_INTERVAL_ENV: &str = "TODOFEED_SYNC_INTERVAL";

/// Configuration for the sync server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Directory where feed files and sync records are written.
    pub store_dir: PathBuf,

    /// Base interval between background syncs.
    pub sync_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            sync_interval: Duration::from_secs(1800),
        }
    }
}

impl ServerConfig {
    /// Creates a configuration with the given store directory.
    pub fn new(store_dir: impl Into<PathBuf>) -> Self {
        Self {
            store_dir: store_dir.into(),
            ..Default::default()
        }
    }

    /// Builder: set the sync interval.
    #[must_use]
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Applies environment overrides on top of this configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `TODOFEED_SYNC_INTERVAL` is set
    /// but is not a positive number of seconds.
    pub fn with_env_overrides(mut self) -> ServerResult<Self> {
        if let Ok(dir) = std::env::var(STORE_DIR_ENV) {
            self.store_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var(SYNC_INTERVAL_ENV) {
            let secs: u64 = raw.parse().map_err(|_| {
                ServerError::config(format!("{SYNC_INTERVAL_ENV} must be seconds, got {raw:?}"))
            })?;
            if secs == 0 {
                return Err(ServerError::config(format!(
                    "{SYNC_INTERVAL_ENV} must be positive"
                )));
            }
            self.sync_interval = Duration::from_secs(secs);
        }
        Ok(self)
    }
}

/// Returns the default store directory.
///
/// Uses `$XDG_DATA_HOME/todofeed` if available, otherwise
/// `~/.local/share/todofeed`, otherwise `./todofeed-store`.
pub fn default_store_dir() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join("todofeed");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/share/todofeed");
    }
    PathBuf::from("todofeed-store")
}
