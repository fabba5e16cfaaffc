//! CLI configuration.
//!
//! All settings live in a single `config.toml` at
//! `~/.config/todofeed/config.toml` by default. The API base URL and
//! token can be overridden from the command line or the
//! `TODOFEED_API_BASE` / `TODOFEED_TOKEN` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use todofeed_provider::{ApiConfig, FetchQuery};
use todofeed_server::SyncTarget;

use crate::error::{CliError, CliResult};

/// Configuration for the todofeed CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Note API connection settings.
    pub api: ApiSettings,

    /// Calendars to sync. An empty list falls back to a single "Todo"
    /// calendar with default fetch parameters.
    #[serde(default)]
    pub calendars: Vec<CalendarSettings>,

    /// Sync daemon settings.
    #[serde(default)]
    pub sync: SyncSettings,
}

/// Note API connection settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL, for example `https://notes.example.com/api/v1`.
    pub base_url: Option<String>,

    /// Bearer token.
    pub token: Option<String>,
}

/// One calendar definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarSettings {
    /// Display name, used in the feed envelope.
    pub name: String,

    /// Number of todos fetched per sync.
    pub size: u32,

    /// Optional server-side text filter.
    pub search_text: Option<String>,

    /// Optional tag filter, by name.
    pub tag_name: Option<String>,

    /// Feed filename in the store. Derived from the name when unset.
    pub filename: Option<String>,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            name: "Todo".to_string(),
            size: todofeed_provider::DEFAULT_PAGE_SIZE,
            search_text: None,
            tag_name: None,
            filename: None,
        }
    }
}

impl CalendarSettings {
    /// Converts to a sync target.
    pub fn to_target(&self) -> SyncTarget {
        let mut query = FetchQuery::with_size(self.size);
        if let Some(ref text) = self.search_text {
            query = query.with_search_text(text);
        }
        if let Some(ref tag) = self.tag_name {
            query = query.with_tag_name(tag);
        }

        let mut target = SyncTarget::new(&self.name, query);
        if let Some(ref filename) = self.filename {
            target = target.with_filename(filename);
        }
        target
    }
}

/// Sync daemon settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Feed store directory. Uses the platform default when unset.
    pub store_dir: Option<PathBuf>,

    /// Seconds between background syncs.
    pub interval_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            store_dir: None,
            interval_secs: 1800,
        }
    }
}

impl CliConfig {
    /// Loads configuration from the default path, or defaults when the
    /// file does not exist.
    pub fn load() -> CliResult<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &PathBuf) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CliError::config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| CliError::config(format!("failed to parse {}: {e}", path.display())))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("todofeed")
            .join("config.toml")
    }

    /// Builds the API config, applying CLI/environment overrides.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no base URL or token is
    /// available from any source.
    pub fn api_config(
        &self,
        base_override: Option<&str>,
        token_override: Option<&str>,
    ) -> CliResult<ApiConfig> {
        let base_url = base_override
            .map(str::to_string)
            .or_else(|| self.api.base_url.clone())
            .ok_or_else(|| {
                CliError::config(
                    "API base URL is not set; use --api-base, TODOFEED_API_BASE, \
                     or [api] base_url in config.toml",
                )
            })?;
        let token = token_override
            .map(str::to_string)
            .or_else(|| self.api.token.clone())
            .ok_or_else(|| {
                CliError::config(
                    "API token is not set; use --token, TODOFEED_TOKEN, \
                     or [api] token in config.toml",
                )
            })?;
        Ok(ApiConfig::new(base_url, token))
    }

    /// Returns the sync targets, falling back to one default calendar.
    pub fn targets(&self) -> Vec<SyncTarget> {
        if self.calendars.is_empty() {
            return vec![CalendarSettings::default().to_target()];
        }
        self.calendars.iter().map(CalendarSettings::to_target).collect()
    }

    /// Returns the configured sync interval.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.sync.interval_secs.max(1))
    }

    /// Returns the feed store directory.
    pub fn store_dir(&self) -> PathBuf {
        self.sync
            .store_dir
            .clone()
            .unwrap_or_else(todofeed_server::config::default_store_dir)
    }

    /// Builds the server configuration, letting `TODOFEED_STORE_DIR` and
    /// `TODOFEED_SYNC_INTERVAL` override the file settings.
    pub fn server_config(&self) -> CliResult<todofeed_server::ServerConfig> {
        Ok(todofeed_server::ServerConfig::new(self.store_dir())
            .with_sync_interval(self.sync_interval())
            .with_env_overrides()?)
    }
}
