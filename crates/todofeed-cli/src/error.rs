//! CLI error types.

use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors surfaced to the user.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, unreadable, or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Note API error.
    #[error("API error: {0}")]
    Api(#[from] todofeed_provider::ApiError),

    /// Feed store or sync error.
    #[error("sync error: {0}")]
    Server(#[from] todofeed_server::ServerError),

    /// Feed assembly error.
    #[error("feed error: {0}")]
    Feed(#[from] todofeed_core::FeedError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more sync targets failed.
    #[error("sync incomplete: {0}")]
    SyncFailed(String),
}

impl CliError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
